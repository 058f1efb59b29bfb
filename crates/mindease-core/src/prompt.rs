//! Prompt text for tip generation.
//!
//! Builders here never fail. Optional inputs that are missing or blank are
//! left out of the prompt.

use std::fmt::{Display, Write};

use chrono::{DateTime, TimeZone, Timelike};

/// Coarse part of the day, partitioned at 12:00, 17:00 and 21:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=11 => TimeOfDay::Morning,
            12..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
            TimeOfDay::Night => "night",
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Prompt for a single tip tailored to the user's mood and situation.
pub fn personalized_tip_prompt<Tz>(
    mood: Option<&str>,
    context: Option<&str>,
    now: &DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let time_of_day = TimeOfDay::from_hour(now.hour());
    let mut prompt = String::from(
        "Generate a personalized mental health tip that feels warm and supportive. ",
    );

    // Writing into a String cannot fail.
    let _ = write!(
        prompt,
        "Current time: {} ({}), Day: {}. ",
        now.format("%H:%M"),
        time_of_day.as_str(),
        now.format("%A")
    );

    if let Some(mood) = non_blank(mood) {
        let _ = write!(prompt, "User's current mood: {mood}. ");
    }
    if let Some(context) = non_blank(context) {
        let _ = write!(prompt, "Context: {context}. ");
    }

    prompt.push_str("Make the tip specific, actionable, and empathetic. ");
    prompt.push_str(
        "Keep it under 80 words and make it feel like a caring friend is giving advice. ",
    );
    prompt.push_str("Format the response as just the tip text, no additional formatting.");
    prompt
}

/// Prompt for a batch of three tips, answered as a JSON array of strings.
pub fn category_tips_prompt(category: &str) -> String {
    format!(
        "Generate 3 practical and supportive mental health tips for '{category}'. \
         Make each tip specific, actionable, and written in a warm, caring tone. \
         Each tip should be under 60 words and feel like advice from a supportive friend. \
         Format as a JSON array of strings."
    )
}
