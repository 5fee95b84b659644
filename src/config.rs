//! Fixed settings of a merge run. There are no flags or config files; `MergeConfig::default()`
//! is what the binary uses and tests build their own.

/// Field delimiter of the loot export and of the formatted output.
pub const LOOT_DELIMITER: u8 = b';';

/// strptime-style pattern of the normalized `timestamp_utc` value.
pub const CUTOFF_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// strptime-style pattern of the leading field of a donation log line.
pub const DONATION_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Header row of a copied donation log; never merged.
pub const DONATION_HEADER: &str =
    "\"Date\"\t\"Player\"\t\"Item\"\t\"Enchantment\"\t\"Quality\"\t\"Amount\"";

/// Settings shared by all stages of one run.
#[derive(Clone, Debug)]
pub struct MergeConfig {
    pub delimiter: u8,
    /// Column compared against `guild`.
    pub guild_column: String,
    pub guild: String,
    /// Column the cutoff is read from.
    pub timestamp_column: String,
    /// Appended to the input's base name to name the filtered file.
    pub formatted_suffix: String,
    pub merged_file_name: String,
    pub donation_header: String,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            delimiter: LOOT_DELIMITER,
            guild_column: "looted_by__guild".to_string(),
            guild: "Smurfing Monkeys".to_string(),
            timestamp_column: "timestamp_utc".to_string(),
            formatted_suffix: "_formatted.txt".to_string(),
            merged_file_name: "merged_donatelog.txt".to_string(),
            donation_header: DONATION_HEADER.to_string(),
        }
    }
}
