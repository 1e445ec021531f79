use crate::config::Interval;
use crate::returns::PricePoint;

/// Resamples ordered closes into bars of `interval` length.
///
/// Each bar starts at `timestamp - timestamp % timeframe_sec` and keeps the
/// last close seen inside it. Already-aligned data passes through unchanged.
///
/// # Arguments
///
/// * `items` - Closes ordered by timestamp.
/// * `interval` - The desired timeframe (never zero seconds).
///
/// # Returns
///
/// * `Vec<PricePoint>` - One point per non-empty bar.
pub fn resample_closes(items: &[PricePoint], interval: Interval) -> Vec<PricePoint> {
    let timeframe_sec = interval.secs();
    let mut resampled = Vec::new();
    let mut current_bar: Option<PricePoint> = None;

    for item in items {
        let bar_start = item.timestamp - (item.timestamp % timeframe_sec);

        match current_bar {
            Some(ref mut bar) if bar.timestamp == bar_start => {
                bar.price = item.price;
            }
            Some(bar) => {
                resampled.push(bar);
                current_bar = Some(PricePoint::new(bar_start, item.price));
            }
            None => {
                current_bar = Some(PricePoint::new(bar_start, item.price));
            }
        }
    }

    if let Some(bar) = current_bar {
        resampled.push(bar);
    }

    resampled
}
