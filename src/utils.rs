use std::io::{Read, Write};

use chrono::{DateTime, Local};
use indicatif::ProgressStyle;

pub fn pb_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        .expect("failed to build progress style")
        .progress_chars("##-")
}

/// Timestamp token used as a new collection identifier
pub fn collection_token(now: DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S%6f").to_string()
}

/// Return `base` or the first `base-N` for which `taken` is false
pub fn next_free_id(base: String, taken: impl Fn(&str) -> bool) -> String {
    if !taken(&base) {
        return base;
    }
    for i in 1.. {
        let id = format!("{base}-{i}");
        if !taken(&id) {
            return id;
        }
    }
    unreachable!()
}

pub fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{}", prompt);
    std::io::stdout().flush()?;
    let v = std::io::stdin()
        .bytes()
        .take_while(|c| c.as_ref().ok() != Some(&b'\n'))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(String::from_utf8(v)?.trim().to_owned())
}
