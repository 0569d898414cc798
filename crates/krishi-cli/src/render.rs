//! Plain-text rendering of resolved screens. Results go to stdout.

use anyhow::{bail, Result};
use krishi_core::catalog::PriceTrend;
use krishi_core::soil::Assessment;
use krishi_core::{
    AnalysisResult, ChatMessage, CropPrice, CropSeason, FetchOutcome, ForumPost, Scheme,
    SoilParameter, ViewState, WeatherReport,
};

/// Print a resolved state. An error outcome becomes the command's error.
pub fn resolved<T>(state: &ViewState<T>, render: impl Fn(&T)) -> Result<()> {
    match state {
        ViewState::Resolved(FetchOutcome::Success(value)) => {
            render(value);
            Ok(())
        }
        ViewState::Resolved(FetchOutcome::Empty { reason }) => {
            println!("{}", reason);
            Ok(())
        }
        ViewState::Resolved(FetchOutcome::Error(err)) => bail!("{}", err),
        ViewState::Idle | ViewState::Loading { .. } => bail!("Request did not complete"),
    }
}

pub fn weather(report: &WeatherReport) {
    let now = &report.current;
    println!("{}, {}, {}", report.location, report.region, report.country);
    println!("  {}°C  {}", now.temp_c, now.condition);
    if let Some(today) = &report.today {
        println!("  Today: {}° / {}°", today.max_c, today.min_c);
    }
    println!(
        "  Humidity {}%  Wind {} km/h {}  Pressure {} mb",
        now.humidity, now.wind_kph, now.wind_direction, now.pressure_mb
    );
    if !report.forecast.is_empty() {
        println!();
        for day in &report.forecast {
            println!(
                "  {} {}  {}° / {}°  {}",
                day.weekday,
                day.date.format("%d %b"),
                day.max_c,
                day.min_c,
                day.condition
            );
        }
    }
}

pub fn message(message: &ChatMessage) {
    let body = match (&message.text, &message.voice_ref) {
        (Some(text), Some(voice)) => format!("{} [voice: {}]", text, voice),
        (Some(text), None) => text.clone(),
        (None, Some(voice)) => format!("[voice: {}]", voice),
        (None, None) => String::new(),
    };
    println!("[{}] {}: {}", message.timestamp, message.sender.display_name(), body);
}

pub fn analysis(result: &AnalysisResult) {
    println!("{}", result);
}

pub fn statuses(statuses: &[(SoilParameter, Assessment)]) {
    for (parameter, assessment) in statuses {
        println!("  {:<12} {}", parameter.display_name(), assessment.label);
    }
}

pub fn seasons(seasons: &[CropSeason]) {
    println!("  {:<12} {:<12} {:<12} {}", "Crop", "Sowing", "Growing", "Harvesting");
    for s in seasons {
        println!("  {:<12} {:<12} {:<12} {}", s.name, s.sowing, s.growing, s.harvesting);
    }
}

pub fn schemes(schemes: &[Scheme]) {
    for scheme in schemes {
        println!("{} ({}, {})", scheme.name, scheme.status.label(), scheme.launch_date);
        println!("  {}", scheme.description);
        for benefit in &scheme.benefits {
            println!("  + {}", benefit);
        }
        for rule in &scheme.eligibility {
            println!("  - {}", rule);
        }
        if let Some(link) = &scheme.link {
            println!("  {}", link);
        }
        println!();
    }
}

pub fn forum(posts: &[ForumPost]) {
    for post in posts {
        let voice = if post.voice_support { " 🎤" } else { "" };
        println!("{}{}", post.topic, voice);
        println!(
            "  {} · {} · {} messages",
            post.user, post.timestamp, post.messages_count
        );
        println!("  {}", post.last_message);
    }
}

pub fn prices(prices: &[CropPrice]) {
    for price in prices {
        println!(
            "  {:<10} ₹{:>7.2}/{:<3} {}  {} ({})",
            price.name,
            price.price_per_kg,
            price.unit,
            trend_arrow(price.trend),
            price.mandi,
            price.last_updated
        );
    }
}

pub fn trend_arrow(trend: PriceTrend) -> &'static str {
    match trend {
        PriceTrend::Up => "▲",
        PriceTrend::Down => "▼",
        PriceTrend::Stable => "■",
    }
}
