/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut state = lock!(generator.state);
///  state.counter += 1;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}
