//! Run statistics.

use std::time::Duration;

use observability::MuxSummary;

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub duration: Duration,

    /// Bytes of sentences that passed checksum validation
    pub nmea_bytes: u64,

    /// Channels still running when shutdown began
    pub active_channels: usize,

    pub active_forwarders: usize,

    pub computers: usize,

    pub last_sentence: Option<String>,

    pub summary: MuxSummary,
}

impl RunStats {
    pub fn sentences_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.summary.total_sentences as f64 / secs
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===\n");
        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Sentences: {}", self.summary.total_sentences);
        println!("   ├─ Rate: {:.2}/s", self.sentences_per_second());
        println!("   ├─ NMEA bytes: {}", self.nmea_bytes);
        println!(
            "   ├─ Bad checksum: {} ({:.2}%)",
            self.summary.bad_checksum, self.summary.reject_rate
        );
        println!("   ├─ Active channels: {}", self.active_channels);
        println!("   ├─ Active forwarders: {}", self.active_forwarders);
        println!("   └─ Computers: {}", self.computers);

        println!("\nSentence length (bytes): {}", self.summary.sentence_length);

        print_counts("Outcomes", &self.summary.outcomes);
        print_counts("Origins", &self.summary.origins);
        print_counts("Sentence types", &self.summary.addresses);

        if let Some(last) = &self.last_sentence {
            println!("\nLast sentence: {last}");
        }
        println!();
    }
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    println!("\n{title}");
    let last = counts.len() - 1;
    for (i, (name, count)) in counts.iter().enumerate() {
        let prefix = if i == last { "└─" } else { "├─" };
        println!("   {prefix} {name}: {count}");
    }
}
