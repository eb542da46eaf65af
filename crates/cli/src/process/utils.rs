/// Registers a panic hook that logs panics using the `tracing` crate
///
/// Panics inside call workers are also caught by the bridge and turned
/// into rejections; the hook only makes sure they are visible in the logs.
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| {
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("<unnamed>");
        match panic.location() {
            Some(loc) => {
                tracing::error!(
                    message = %panic,
                    panic.thread = thread_name,
                    panic.file = loc.file(),
                    panic.line = loc.line(),
                    panic.column = loc.column(),
                );
            }
            None => tracing::error!(message = %panic, panic.thread = thread_name),
        }
    }));
}

pub fn report_build_info() {
    let build = common::prelude::build_info();

    tracing::info!(
        build_profile = build.build_profile,
        version = build.version,
        rust_version = build.rust_version,
        target = build.target,
        age_version = build.age_version,
        "agebox starting up"
    );
}
