//! Progress Reporting

use indicatif::{ProgressBar, ProgressStyle};

/// Returns a progress bar for `total` units of work labelled with `tag`.
/// The bar draws to stderr and stays hidden when stderr is not a terminal.
///
/// * `total` - Units of work.
/// * `tag`   - Label.
pub fn create_progress_bar(total: u64, tag: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(tag.to_owned());
    bar
}
