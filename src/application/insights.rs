//! Human-readable summary lines for an analysis report.
//!
//! Every line except the closer is a pure function of the aggregated numbers.
//! The closer is drawn from [`CLOSERS`] with the generator's own RNG, which can
//! be seeded for reproducible output.

use crate::domain::{ActivityPattern, LanguageTotals, RepositorySummary};
use chrono::{DateTime, Months, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Rough bytes per line of source, used for the top-language estimate
const BYTES_PER_LINE: u64 = 30;

const KIB_PER_MIB: u64 = 1024;

/// Pool the final line of every report is chosen from.
pub const CLOSERS: &[&str] = &[
    "Your profile tells a story of steady, deliberate building. Keep shipping! 🚀",
    "Consistency compounds: every commit here is an investment in the next one. 💪",
    "There is a future maintainer of something big hiding in these repos. 🌟",
    "The best repository on this profile is probably the one you start next. ✨",
    "Small commits, big trajectory. Keep the streak alive! 📈",
    "Somewhere out there, a stranger is learning from your code right now. 📚",
    "Your commit history reads like a changelog of a developer leveling up. 🏆",
    "Open source is better with you in it. Keep pushing! 🌍",
    "The groundwork is laid; the interesting part starts now. 🏗️",
    "Every README here is a door someone else can walk through. 🚪",
    "Your repos say curious, and curiosity scales. 🧠",
    "Ship it, learn from it, ship the next one. That is the whole game. 🔁",
];

/// Produces the `insights` lines of a report.
pub struct InsightGenerator {
    rng: Mutex<StdRng>,
}

impl InsightGenerator {
    /// Generator whose closer choice is unpredictable.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Generator whose closer sequence is fixed by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build the insight lines for one user.
    ///
    /// `repos` is the full repository list (forks included), `languages` the
    /// folded totals of the selected repositories and `now` the reference
    /// instant for the "recent activity" window.
    pub fn generate(
        &self,
        repos: &[RepositorySummary],
        languages: &LanguageTotals,
        activity: &ActivityPattern,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut insights = Vec::new();
        let total = repos.len();
        let lang_count = languages.len();

        let portfolio = match total {
            n if n > 50 => "absolutely stacked",
            n if n > 20 => "pretty solid",
            _ => "growing strong",
        };
        insights.push(format!(
            "📊 Total Repos: {} (your portfolio is {}!)",
            total, portfolio
        ));

        let breadth = match lang_count {
            n if n > 10 => "polyglot energy",
            n if n > 5 => "multi-lingual",
            n if n > 2 => "diverse skills",
            _ => "focused approach",
        };
        insights.push(format!("🚀 Languages Used: {} ({})", lang_count, breadth));

        if let Some((language, bytes)) = top_language(languages) {
            insights.push(format!(
                "💻 Top Language: {} (~{} lines)",
                language,
                group_thousands(bytes / BYTES_PER_LINE)
            ));
        }

        if let Some((year, count)) = activity.busiest_year() {
            let verdict = if count > 10 {
                "a breakout year"
            } else {
                "your most productive year so far"
            };
            insights.push(format!(
                "📅 Busiest Year: {} ({} repos) - {}",
                year, count, verdict
            ));
        }

        let forked = repos.iter().filter(|r| r.is_fork).count();
        if forked > 0 {
            let verdict = match forked {
                n if n > 20 => "a serious collector of other people's ideas",
                n if n > 10 => "open source explorer",
                _ => "dipping into the community pool",
            };
            insights.push(format!("🍴 Forked Repos: {} - {}", forked, verdict));
        }

        insights.push(star_insight(repos));

        if lang_count > 10 {
            insights.push(format!(
                "🌈 Polyglot Alert: {} languages across your top projects",
                lang_count
            ));
        } else if lang_count > 5 {
            insights.push(format!(
                "🎨 Multi-talented: {} languages across your top projects",
                lang_count
            ));
        } else if lang_count <= 2 {
            insights.push(format!(
                "🎯 Specialist Energy: {} language{} - depth over breadth",
                lang_count,
                plural(lang_count)
            ));
        }

        if let Some(line) = journey_insight(repos) {
            insights.push(line);
        }

        if let Some(line) = largest_project_insight(repos) {
            insights.push(line);
        }

        if let Some(line) = community_insight(repos) {
            insights.push(line);
        }

        insights.push(recent_activity_insight(repos, now));
        insights.push(self.closer());

        insights
    }

    fn closer(&self) -> String {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        CLOSERS
            .choose(&mut *rng)
            .copied()
            .unwrap_or_default()
            .to_string()
    }
}

impl Default for InsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Language with the most bytes; alphabetical order breaks ties.
fn top_language(languages: &LanguageTotals) -> Option<(&str, u64)> {
    languages
        .iter()
        .fold(None, |best: Option<(&str, u64)>, (lang, &bytes)| match best {
            Some((_, top)) if top >= bytes => best,
            _ => Some((lang.as_str(), bytes)),
        })
}

fn star_insight(repos: &[RepositorySummary]) -> String {
    let total_stars: u64 = repos.iter().map(|r| r.stars).sum();
    if total_stars == 0 {
        return "⭐ Stars: 0 - coding in the shadows, respect the grind 🥷".to_string();
    }

    let avg_stars = total_stars as f64 / repos.len().max(1) as f64;
    if avg_stars > 50.0 {
        format!("⭐ Star Power: {} total stars - certified GitHub famous 👑", total_stars)
    } else if avg_stars > 10.0 {
        format!("⭐ Star Power: {} total stars - people clearly like what you build 📈", total_stars)
    } else {
        format!("⭐ Star Power: {} total stars - small but mighty 💪", total_stars)
    }
}

fn journey_insight(repos: &[RepositorySummary]) -> Option<String> {
    if repos.len() < 2 {
        return None;
    }
    let first = repos.iter().map(|r| r.created_at).min()?;
    let last = repos.iter().map(|r| r.created_at).max()?;
    let active_days = (last - first).num_days();

    match active_days {
        d if d > 2000 => Some(format!(
            "⏰ Coding Journey: {}+ years active - a true veteran 🦕",
            d / 365
        )),
        d if d > 1000 => Some(format!(
            "⏰ Coding Journey: {} years active - you've seen some things 👨‍💻",
            d / 365
        )),
        d if d > 365 => {
            Some("⏰ Coding Journey: over a year of building - consistency pays 📊".to_string())
        }
        d if d > 100 => Some(format!(
            "⏰ Coding Journey: {} months in - building momentum 🚀",
            d / 30
        )),
        _ => None,
    }
}

fn largest_project_insight(repos: &[RepositorySummary]) -> Option<String> {
    let largest = repos
        .iter()
        .filter(|r| !r.is_fork)
        .fold(None, |best: Option<&RepositorySummary>, r| match best {
            Some(b) if b.size >= r.size => best,
            _ => Some(r),
        })?;
    let size_mb = largest.size / KIB_PER_MIB;

    if largest.size > KIB_PER_MIB * 100 {
        Some(format!(
            "🏗️ Big Project Energy: {} is {}MB - go big or go home",
            largest.name, size_mb
        ))
    } else if largest.size > KIB_PER_MIB * 50 {
        Some(format!(
            "📦 Substantial Work: {} weighs in at {}MB - not a weekend project",
            largest.name, size_mb
        ))
    } else {
        None
    }
}

fn community_insight(repos: &[RepositorySummary]) -> Option<String> {
    let own_forks: u64 = repos
        .iter()
        .filter(|r| !r.is_fork)
        .map(|r| r.forks)
        .sum();

    match own_forks {
        0 => None,
        n if n > 50 => Some(format!(
            "🌟 Community Impact: {} forks of your repos - you're changing how others build 👑",
            n
        )),
        n if n > 10 => Some(format!(
            "🤝 Open Source Contributor: {} forks across your repos 📝",
            n
        )),
        n => Some(format!(
            "🌱 Growing Influence: {} fork{} - someone found your code useful",
            n,
            plural(n as usize)
        )),
    }
}

fn recent_activity_insight(repos: &[RepositorySummary], now: DateTime<Utc>) -> String {
    let cutoff = now.checked_sub_months(Months::new(6)).unwrap_or(now);
    let recent = repos.iter().filter(|r| r.created_at > cutoff).count();

    match recent {
        0 => "😴 Hibernation Mode: no new repos in six months - cooking something big? 🌱"
            .to_string(),
        n if n > 5 => format!("🔥 Recent Activity: {} repos in six months - on a roll 😤", n),
        n => format!(
            "📈 Steady Progress: {} recent repo{} in six months 👑",
            n,
            plural(n)
        ),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// `1234567` → `"1,234,567"`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
