use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar over the gates of a circuit, in the style used by every long-running stage
pub fn gate_progress_bar(num_gates: usize, message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(num_gates as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
    {
        pb.set_style(style.progress_chars("##-"));
    }
    pb.set_message(message);
    pb
}
