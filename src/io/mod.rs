// Process-level I/O: instance discovery, locking and signals
pub mod instance; // Finding and commanding the running daemon
pub mod lock; // Single-instance lock file
pub mod signals; // Unix signal handling
