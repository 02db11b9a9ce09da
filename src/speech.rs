use chrono::{Datelike, NaiveDate};

pub const WELCOME_AUDIO: &str = "https://s3.amazonaws.com/ask-storage/tidePooler/OceanWaves.mp3";
pub const WHICH_DATE: &str = "Which date would you like boba information for?";
pub const GOODBYE: &str = "Goodbye";
pub const COMMS_FAILURE: &str =
    "Sorry, I'm having trouble reaching Facebook right now. Please try again later.";

pub fn welcome_ssml() -> String {
    format!(
        "<speak>Welcome to Drive Through Boba. <audio src='{}'/>{}</speak>",
        WELCOME_AUDIO, WHICH_DATE
    )
}

pub fn welcome_reprompt() -> String {
    "I can lead you through providing a day of the week to get boba information, \
     or you can simply open Drive Through Boba and ask a question like, \
     what is the special today."
        .to_string()
}

pub fn help() -> String {
    format!(
        "I can lead you through providing a day of the week to get boba information, \
         or you can simply open Drive Through Boba and ask a question like, \
         what is the special on Saturday. Or you can say exit. {}",
        WHICH_DATE
    )
}

pub fn date_not_understood_reprompt() -> String {
    format!(
        "Please try again saying a day of the week, for example, Saturday. {}",
        WHICH_DATE
    )
}

pub fn date_not_understood() -> String {
    format!("I'm sorry, I didn't understand that date. {}", date_not_understood_reprompt())
}

/// "Saturday June 20th"
pub fn format_spoken_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}", date.format("%A %B"), day, suffix)
}

/// Fallback for an empty selection. For an explicit date, "today" in the
/// configured phrase becomes "on <spoken date>".
pub fn closed(closed_message: &str, target: Option<NaiveDate>) -> String {
    match target {
        Some(date) => closed_message.replacen("today", &format!("on {}", format_spoken_date(date)), 1),
        None => closed_message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CLOSED_MESSAGE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spoken_dates_use_ordinals() {
        assert_eq!(format_spoken_date(date(2015, 6, 20)), "Saturday June 20th");
        assert_eq!(format_spoken_date(date(2016, 6, 1)), "Wednesday June 1st");
        assert_eq!(format_spoken_date(date(2016, 6, 2)), "Thursday June 2nd");
        assert_eq!(format_spoken_date(date(2016, 6, 3)), "Friday June 3rd");
        assert_eq!(format_spoken_date(date(2016, 6, 11)), "Saturday June 11th");
        assert_eq!(format_spoken_date(date(2016, 6, 12)), "Sunday June 12th");
        assert_eq!(format_spoken_date(date(2016, 6, 13)), "Monday June 13th");
        assert_eq!(format_spoken_date(date(2016, 6, 21)), "Tuesday June 21st");
        assert_eq!(format_spoken_date(date(2016, 5, 31)), "Tuesday May 31st");
    }

    #[test]
    fn closed_message_names_the_requested_day() {
        assert_eq!(
            closed(DEFAULT_CLOSED_MESSAGE, Some(date(2016, 6, 1))),
            "Drive through boba is not open on Wednesday June 1st or they haven't posted on facebook yet."
        );
    }

    #[test]
    fn closed_message_without_target_is_unchanged() {
        assert_eq!(closed(DEFAULT_CLOSED_MESSAGE, None), DEFAULT_CLOSED_MESSAGE);
        assert_eq!(closed("Closed.", Some(date(2016, 6, 1))), "Closed.");
    }

    #[test]
    fn welcome_wraps_audio_in_speak() {
        let ssml = welcome_ssml();
        assert!(ssml.starts_with("<speak>") && ssml.ends_with("</speak>"));
        assert!(ssml.contains(WELCOME_AUDIO));
    }
}
