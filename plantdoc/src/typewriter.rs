//! Progressive reveal of a finished reply.
//!
//! The stream yields growing prefixes of the text, one character at a time,
//! pausing `interval` before each. Prefixes always end on a char boundary.

use std::time::Duration;

use futures::Stream;
use futures::stream;

pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(15);

/// Stream successive prefixes of `text` (1..=n chars). Empty text yields nothing.
pub fn typewriter(text: impl Into<String>, interval: Duration) -> impl Stream<Item = String> {
    let text = text.into();
    let mut ends: Vec<usize> = text.char_indices().map(|(i, c)| i + c.len_utf8()).collect();
    ends.reverse();

    stream::unfold((text, ends), move |(text, mut ends)| async move {
        let end = ends.pop()?;
        tokio::time::sleep(interval).await;
        let prefix = text[..end].to_string();
        Some((prefix, (text, ends)))
    })
}

#[cfg(test)]
#[path = "typewriter_test.rs"]
mod tests;
