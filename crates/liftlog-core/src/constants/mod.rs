// ABOUTME: Engine-wide constants organized by domain
// ABOUTME: Unit conversion factors, store collection names, and derivation limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 LiftLog Fitness

/// Unit conversion factors into the canonical unit system
pub mod units;

/// Document store collection names owned by the canonical schema
pub mod collections {
    /// Live and archived sessions
    pub const SESSIONS: &str = "sessions";
    /// Current and superseded personal records
    pub const PERSONAL_RECORDS: &str = "personal_records";
    /// Published routine templates (read-only, owned by the catalog)
    pub const ROUTINE_TEMPLATES: &str = "routine_templates";
}

/// Limits applied when deriving metrics
pub mod limits {
    /// Default number of points kept in each snapshot trend
    pub const DEFAULT_TREND_LIMIT: usize = 52;

    /// Highest rep count for which the Brzycki estimate is defined
    pub const BRZYCKI_MAX_REPS: u32 = 36;

    /// Divisor of the Epley estimate: `load x (1 + reps / 30)`
    pub const EPLEY_REP_DIVISOR: f64 = 30.0;

    /// Decimal places kept on canonical kilogram values
    pub const MASS_DECIMALS: i32 = 3;

    /// Decimal places kept on canonical second values
    pub const DURATION_DECIMALS: i32 = 3;
}
