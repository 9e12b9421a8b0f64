use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;

/// Immutable, read-only input to every pipeline stage.
///
/// Built once per request (see `DetectionConfig::default`,
/// `DetectionConfig::preset`, and `DetectionConfig::from_env`) and never
/// mutated afterward; stages only ever hold a shared reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionConfig {
    pub smurfing_threshold: Decimal,
    pub time_window_hours: i64,
    pub min_fan_degree: usize,
    pub below_threshold_ratio: f64,

    pub pass_through_ratio_min: f64,
    pub pass_through_ratio_max: f64,
    pub min_chain_length: usize,
    pub velocity_threshold_hours: f64,

    pub min_cycle_length: usize,
    pub max_cycle_length: usize,
    pub cycle_variance_threshold: f64,
    pub max_sccs: usize,
    pub max_cycle_starts_per_scc: usize,
    pub max_raw_cycles_per_scc: usize,
    pub max_results: usize,

    pub score_cycle_member: u32,
    pub score_fan_in_smurfing: u32,
    pub score_fan_out_smurfing: u32,
    pub score_shell_account: u32,
    pub score_high_velocity: u32,
    pub score_below_threshold: u32,
    pub score_multiple_patterns: u32,
    pub score_high_risk_pattern: u32,

    pub min_suspicion_score: u32,
    pub tx_per_day_threshold: f64,
    /// Separate from `below_threshold_ratio` (smurfing window test):
    /// this gates the scorer's standalone structuring flag, computed
    /// over *all* of an account's adjacent edges rather than a sliding
    /// window.
    pub below_threshold_structuring_ratio: f64,

    pub merchant_min_tx: usize,
    pub merchant_min_in_degree: usize,
    pub merchant_diversity_ratio: f64,

    pub payroll_min_tx: usize,
    pub payroll_regularity: f64,

    pub exchange_min_degree: usize,
    pub exchange_flow_ratio_min: f64,
    pub exchange_flow_ratio_max: f64,

    /// Enables the enhanced-mode-only rules: whitelist suppression in
    /// the false-positive guard, the 27-32 day payroll bucket, and the
    /// high-risk-pattern scoring bonus.
    pub enhanced: bool,

    pub known_merchants: HashSet<String>,
    pub known_payroll_providers: HashSet<String>,
    pub whitelisted_accounts: HashSet<String>,
    pub high_risk_patterns: HashSet<String>,

    pub cycle_detection_deadline_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            smurfing_threshold: dec!(10000),
            time_window_hours: 72,
            min_fan_degree: 5,
            below_threshold_ratio: 0.8,

            pass_through_ratio_min: 0.8,
            pass_through_ratio_max: 1.2,
            min_chain_length: 3,
            velocity_threshold_hours: 24.0,

            min_cycle_length: 3,
            max_cycle_length: 5,
            cycle_variance_threshold: 0.1,
            max_sccs: 20,
            max_cycle_starts_per_scc: 50,
            max_raw_cycles_per_scc: 100,
            max_results: 50,

            score_cycle_member: 50,
            score_fan_in_smurfing: 30,
            score_fan_out_smurfing: 30,
            score_shell_account: 20,
            score_high_velocity: 10,
            score_below_threshold: 20,
            score_multiple_patterns: 10,
            score_high_risk_pattern: 15,

            min_suspicion_score: 40,
            tx_per_day_threshold: 10.0,
            below_threshold_structuring_ratio: 0.7,

            merchant_min_tx: 50,
            merchant_min_in_degree: 20,
            merchant_diversity_ratio: 0.7,

            payroll_min_tx: 10,
            payroll_regularity: 0.6,

            exchange_min_degree: 15,
            exchange_flow_ratio_min: 0.7,
            exchange_flow_ratio_max: 1.3,

            enhanced: false,

            known_merchants: default_known_merchants(),
            known_payroll_providers: default_known_payroll_providers(),
            whitelisted_accounts: HashSet::new(),
            high_risk_patterns: default_high_risk_patterns(),

            cycle_detection_deadline_secs: 30,
        }
    }
}

fn default_known_merchants() -> HashSet<String> {
    ["AMAZON", "WALMART", "TARGET", "COSTCO", "SHOPIFY"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_known_payroll_providers() -> HashSet<String> {
    ["ADP", "GUSTO", "PAYCHEX", "PAYROLL"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_high_risk_patterns() -> HashSet<String> {
    ["SHELL", "OFFSHORE", "ANON"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Named tunings of the detector, mirroring a fixed set of deployment
/// profiles rather than free-form overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Aggressive,
    Conservative,
    Balanced,
}

impl Preset {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "aggressive" => Some(Preset::Aggressive),
            "conservative" => Some(Preset::Conservative),
            "balanced" => Some(Preset::Balanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Aggressive => "aggressive",
            Preset::Conservative => "conservative",
            Preset::Balanced => "balanced",
        }
    }
}

impl DetectionConfig {
    /// Build a config tuned to a named preset, leaving every other key
    /// at its default value.
    pub fn preset(preset: Preset) -> Self {
        let mut cfg = Self::default();
        match preset {
            Preset::Aggressive => {
                cfg.min_fan_degree = 3;
                cfg.min_suspicion_score = 30;
                cfg.enhanced = true;
            }
            Preset::Conservative => {
                cfg.min_fan_degree = 7;
                cfg.min_suspicion_score = 55;
            }
            Preset::Balanced => {}
        }
        cfg
    }

    /// Apply environment-variable overrides on top of an existing
    /// config. Reads once; callers decide when in the request lifecycle
    /// to call this (normally process startup).
    ///
    /// Every field on `DetectionConfig` has a matching upper-snake-case
    /// environment variable (e.g. `min_chain_length` -> `MIN_CHAIN_LENGTH`,
    /// `known_merchants` -> a comma-separated `KNOWN_MERCHANTS`); an unset
    /// or unparseable variable leaves the field at its current value.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_decimal("SMURFING_THRESHOLD") {
            self.smurfing_threshold = v;
        }
        if let Some(v) = env_i64("TIME_WINDOW_HOURS") {
            self.time_window_hours = v;
        }
        if let Some(v) = env_usize("MIN_FAN_DEGREE") {
            self.min_fan_degree = v;
        }
        if let Some(v) = env_f64("BELOW_THRESHOLD_RATIO") {
            self.below_threshold_ratio = v;
        }

        if let Some(v) = env_f64("PASS_THROUGH_RATIO_MIN") {
            self.pass_through_ratio_min = v;
        }
        if let Some(v) = env_f64("PASS_THROUGH_RATIO_MAX") {
            self.pass_through_ratio_max = v;
        }
        if let Some(v) = env_usize("MIN_CHAIN_LENGTH") {
            self.min_chain_length = v;
        }
        if let Some(v) = env_f64("VELOCITY_THRESHOLD_HOURS") {
            self.velocity_threshold_hours = v;
        }

        if let Some(v) = env_usize("MIN_CYCLE_LENGTH") {
            self.min_cycle_length = v;
        }
        if let Some(v) = env_usize("MAX_CYCLE_LENGTH") {
            self.max_cycle_length = v;
        }
        if let Some(v) = env_f64("CYCLE_VARIANCE_THRESHOLD") {
            self.cycle_variance_threshold = v;
        }
        if let Some(v) = env_usize("MAX_SCCS") {
            self.max_sccs = v;
        }
        if let Some(v) = env_usize("MAX_CYCLE_STARTS_PER_SCC") {
            self.max_cycle_starts_per_scc = v;
        }
        if let Some(v) = env_usize("MAX_RAW_CYCLES_PER_SCC") {
            self.max_raw_cycles_per_scc = v;
        }
        if let Some(v) = env_usize("MAX_RESULTS") {
            self.max_results = v;
        }

        if let Some(v) = env_u32("SCORE_CYCLE_MEMBER") {
            self.score_cycle_member = v;
        }
        if let Some(v) = env_u32("SCORE_FAN_IN_SMURFING") {
            self.score_fan_in_smurfing = v;
        }
        if let Some(v) = env_u32("SCORE_FAN_OUT_SMURFING") {
            self.score_fan_out_smurfing = v;
        }
        if let Some(v) = env_u32("SCORE_SHELL_ACCOUNT") {
            self.score_shell_account = v;
        }
        if let Some(v) = env_u32("SCORE_HIGH_VELOCITY") {
            self.score_high_velocity = v;
        }
        if let Some(v) = env_u32("SCORE_BELOW_THRESHOLD") {
            self.score_below_threshold = v;
        }
        if let Some(v) = env_u32("SCORE_MULTIPLE_PATTERNS") {
            self.score_multiple_patterns = v;
        }
        if let Some(v) = env_u32("SCORE_HIGH_RISK_PATTERN") {
            self.score_high_risk_pattern = v;
        }

        if let Some(v) = env_u32("MIN_SUSPICION_SCORE") {
            self.min_suspicion_score = v;
        }
        if let Some(v) = env_f64("TX_PER_DAY_THRESHOLD") {
            self.tx_per_day_threshold = v;
        }
        if let Some(v) = env_f64("BELOW_THRESHOLD_STRUCTURING_RATIO") {
            self.below_threshold_structuring_ratio = v;
        }

        if let Some(v) = env_usize("MERCHANT_MIN_TX") {
            self.merchant_min_tx = v;
        }
        if let Some(v) = env_usize("MERCHANT_MIN_IN_DEGREE") {
            self.merchant_min_in_degree = v;
        }
        if let Some(v) = env_f64("MERCHANT_DIVERSITY_RATIO") {
            self.merchant_diversity_ratio = v;
        }

        if let Some(v) = env_usize("PAYROLL_MIN_TX") {
            self.payroll_min_tx = v;
        }
        if let Some(v) = env_f64("PAYROLL_REGULARITY") {
            self.payroll_regularity = v;
        }

        if let Some(v) = env_usize("EXCHANGE_MIN_DEGREE") {
            self.exchange_min_degree = v;
        }
        if let Some(v) = env_f64("EXCHANGE_FLOW_RATIO_MIN") {
            self.exchange_flow_ratio_min = v;
        }
        if let Some(v) = env_f64("EXCHANGE_FLOW_RATIO_MAX") {
            self.exchange_flow_ratio_max = v;
        }

        if let Some(v) = env_bool("ENHANCED") {
            self.enhanced = v;
        }
        if let Some(v) = env_u64("CYCLE_DETECTION_DEADLINE_SECS") {
            self.cycle_detection_deadline_secs = v;
        }

        if let Some(v) = env_string_set("KNOWN_MERCHANTS") {
            self.known_merchants = v;
        }
        if let Some(v) = env_string_set("KNOWN_PAYROLL_PROVIDERS") {
            self.known_payroll_providers = v;
        }
        if let Some(v) = env_string_set("WHITELISTED_ACCOUNTS") {
            self.whitelisted_accounts = v;
        }
        if let Some(v) = env_string_set("HIGH_RISK_PATTERNS") {
            self.high_risk_patterns = v;
        }

        self
    }

    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }
}

fn env_decimal(key: &str) -> Option<Decimal> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_i64(key: &str) -> Option<i64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok()?.parse().ok()
}

/// Comma-separated list -> set, e.g. `KNOWN_MERCHANTS=AMAZON,WALMART`.
/// An empty or unset variable leaves the field untouched rather than
/// clearing it; to intentionally empty a set, pass a single comma.
fn env_string_set(key: &str) -> Option<HashSet<String>> {
    let raw = std::env::var(key).ok()?;
    if raw.is_empty() {
        return None;
    }
    Some(
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}
