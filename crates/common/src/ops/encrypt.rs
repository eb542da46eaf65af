use std::io::Write;
use std::str::FromStr;

use age::armor::{ArmoredWriter, Format};
use age::x25519;

use crate::contract::ValidatedArgs;
use crate::error::CallError;
use crate::value::Outcome;

/// Handler for `encrypt(plaintext, recipients)`; resolves to armored ciphertext.
pub fn encrypt(args: &ValidatedArgs) -> Result<Outcome, CallError> {
    encrypt_text(args.string(0)?, args.strings(1)?).map(Outcome::Text)
}

/// Encrypt `plaintext` to every recipient and return the ASCII-armored result.
///
/// All recipients are parsed before anything is encrypted, so one bad key
/// fails the whole call. Positions in errors are 1-based.
pub fn encrypt_text(plaintext: &str, recipients: &[String]) -> Result<String, CallError> {
    let recipients = recipients
        .iter()
        .enumerate()
        .map(|(i, text)| {
            x25519::Recipient::from_str(text).map_err(|reason| CallError::RecipientParse {
                index: i + 1,
                reason: reason.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let encryptor =
        age::Encryptor::with_recipients(recipients.iter().map(|r| r as &dyn age::Recipient))
            .map_err(CallError::EncryptStart)?;

    let mut ciphertext = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut ciphertext)
        .map_err(|e| CallError::EncryptStart(e.into()))?;
    writer
        .write_all(plaintext.as_bytes())
        .map_err(|e| CallError::stream("failed to write to age encryptor", e))?;
    writer
        .finish()
        .map_err(|e| CallError::stream("failed to close age encryptor", e))?;

    let armored = armor(&ciphertext, Vec::new())?;

    String::from_utf8(armored)
        .map_err(|_| CallError::InternalFault("armor produced non-UTF-8 output".to_string()))
}

/// ASCII-armor `ciphertext` into `output`. Writing and closing the armor
/// report the same step.
fn armor<W: Write>(ciphertext: &[u8], output: W) -> Result<W, CallError> {
    let armor_err = |e: std::io::Error| CallError::stream("failed to write to age armor", e);
    let mut armor = ArmoredWriter::wrap_output(output, Format::AsciiArmor).map_err(armor_err)?;
    armor.write_all(ciphertext).map_err(armor_err)?;
    armor.finish().map_err(armor_err)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug)]
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_armor_failure_names_the_armor_step() {
        let err = armor(b"ciphertext bytes", BrokenPipe).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StreamIoError);
        assert_eq!(err.to_string(), "failed to write to age armor: pipe closed");
    }

    fn recipient() -> String {
        x25519::Identity::generate().to_public().to_string()
    }

    #[test]
    fn test_output_is_armored() {
        let armored = encrypt_text("hello", &[recipient()]).unwrap();
        assert!(armored.starts_with("-----BEGIN AGE ENCRYPTED FILE-----"));
        assert!(armored.trim_end().ends_with("-----END AGE ENCRYPTED FILE-----"));
        assert!(!armored.contains("hello"));
    }

    #[test]
    fn test_no_recipients_cannot_start() {
        let err = encrypt_text("hello", &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CryptoOperationError);
        assert!(err.to_string().starts_with("failed to start age writer"));
    }

    #[test]
    fn test_bad_recipient_names_its_position() {
        let err = encrypt_text("hello", &["not-a-valid-key".to_string()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::KeyParseError);
        assert!(err
            .to_string()
            .starts_with("recipient #1 could not be parsed as an age public key"));

        let err = encrypt_text(
            "hello",
            &[recipient(), recipient(), "age1bogus".to_string(), "also bad".to_string()],
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("recipient #3 "));
    }

    #[test]
    fn test_empty_plaintext_is_allowed() {
        let armored = encrypt_text("", &[recipient()]).unwrap();
        assert!(armored.starts_with("-----BEGIN AGE ENCRYPTED FILE-----"));
    }
}
