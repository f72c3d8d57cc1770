//! Life path number from a birth date

/// Sums that are kept as-is instead of being reduced further
pub const MASTER_NUMBERS: [u32; 3] = [11, 22, 33];

fn digit_sum(n: u32) -> u32 {
    n.to_string().chars().filter_map(|c| c.to_digit(10)).sum()
}

/// Life path number for a `YYYY-MM-DD` date string
///
/// Digits are summed and the sum reduced until a single digit remains. 11, 22
/// and 33 stop the reduction. Non-digit characters are ignored; empty input
/// yields 0.
#[must_use]
pub fn life_path_number(date: &str) -> u32 {
    let mut sum: u32 = date.chars().filter_map(|c| c.to_digit(10)).sum();

    while sum > 9 {
        if MASTER_NUMBERS.contains(&sum) {
            return sum;
        }
        sum = digit_sum(sum);
    }
    sum
}
