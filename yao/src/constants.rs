/// Shared constants for the yao garbled circuits library
/// Size of a wire key in bytes (128-bit security parameter)
pub const KEY_SIZE: usize = 16;

/// Size of a keystream block and of a single garbled-table ciphertext
pub const CIPHERTEXT_SIZE: usize = 2 * KEY_SIZE;

/// Number of ciphertexts in a garbled table, one per input-bit combination
pub const TABLE_SIZE: usize = 4;

/// Upper bound on the number of candidates offered to a single oblivious transfer
pub const MAX_OT_CANDIDATES: usize = 8;

/// Default read buffer for circuit description files (64KB)
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Progress update interval - update progress bar/spinner every N operations
pub const PROGRESS_UPDATE_INTERVAL: u32 = 1000;
