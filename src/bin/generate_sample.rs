use anyhow::{Context, Result};

const JOBS: [&str; 6] = ["admin.", "blue-collar", "technician", "services", "management", "retired"];
const MARITAL: [&str; 3] = ["married", "single", "divorced"];
const YES_NO_UNKNOWN: [&str; 3] = ["no", "yes", "unknown"];
const CONTACT: [&str; 2] = ["cellular", "telephone"];
const MONTHS: [&str; 10] = ["mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];
const DAYS: [&str; 5] = ["mon", "tue", "wed", "thu", "fri"];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        options[(self.next_u64() % options.len() as u64) as usize]
    }

    fn range(&mut self, low: i64, high: i64) -> i64 {
        low + (self.next_u64() % (high - low + 1) as u64) as i64
    }
}

/// Subscription odds grow for the young, the retired and cellular contacts,
/// so filtering visibly moves the target proportions.
fn subscribed(rng: &mut SimpleRng, age: i64, job: &str, contact: &str) -> bool {
    let mut p: f64 = 0.08;
    if age < 25 || age > 60 {
        p += 0.15;
    }
    if job == "retired" {
        p += 0.10;
    }
    if contact == "cellular" {
        p += 0.05;
    }
    rng.next_f64() < p
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let rows = std::env::args()
        .nth(1)
        .map(|n| n.parse::<usize>())
        .transpose()
        .context("row count must be a number")?
        .unwrap_or(1000);
    let output_path = "bank-additional-sample.csv";

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(output_path)
        .context("creating output file")?;
    writer.write_record([
        "age", "job", "marital", "default", "housing", "loan", "contact", "month",
        "day_of_week", "duration", "y",
    ])?;

    for _ in 0..rows {
        let age = rng.range(18, 95);
        let job = if age > 65 { "retired" } else { rng.pick(&JOBS) };
        let contact = rng.pick(&CONTACT);
        let y = if subscribed(&mut rng, age, job, contact) { "yes" } else { "no" };
        writer.write_record([
            age.to_string().as_str(),
            job,
            rng.pick(&MARITAL),
            rng.pick(&YES_NO_UNKNOWN[..2]),
            rng.pick(&YES_NO_UNKNOWN),
            rng.pick(&YES_NO_UNKNOWN),
            contact,
            rng.pick(&MONTHS),
            rng.pick(&DAYS),
            rng.range(0, 1500).to_string().as_str(),
            y,
        ])?;
    }
    writer.flush()?;

    println!("Wrote {rows} campaign records to {output_path}");
    Ok(())
}
