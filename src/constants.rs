pub const LOCAL_PROVIDER: &str = "local";

pub mod hashing {

    pub const PBKDF2_ITERATIONS: u32 = 10_000;

    pub const DERIVED_KEY_LEN: usize = 64;

    pub const SALT_LEN: usize = 16;

    /// Passwords must be strictly longer than this to be hashed on save.
    pub const MIN_PASSWORD_LEN_EXCLUSIVE: usize = 6;
}

pub mod limits {

    pub const DEFAULT_USERNAME_MAX_ATTEMPTS: u32 = 1000;

    pub const MAX_USERNAME_LEN: usize = 64;
}

pub mod session {

    pub const USER_ID_KEY: &str = "user_id";
}
