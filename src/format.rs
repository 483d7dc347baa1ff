//! Plain-text renderings used in resolution traces.

/// Basis points as a percentage with two decimals: `260` -> `"2.60%"`.
pub fn bps_to_percent(fee_bps: u32) -> String {
    format!("{}.{:02}%", fee_bps / 100, fee_bps % 100)
}

/// Minor units as major units with thousands separators: `5_000_000` -> `"50,000.00"`.
pub fn format_minor_units(amount: u64) -> String {
    let major = (amount / 100).to_string();
    let mut grouped = String::with_capacity(major.len() + major.len() / 3);
    for (i, digit) in major.chars().enumerate() {
        if i > 0 && (major.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}.{:02}", grouped, amount % 100)
}
