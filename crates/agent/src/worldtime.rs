use chrono::Utc;
use chrono_tz::Tz;

/// Fixed city to IANA zone table. Unknown cities are a content outcome
/// ("I don't know."), never a failure.
const CITY_ZONES: &[(&str, Tz)] = &[
    ("Zurich", chrono_tz::Europe::Zurich),
    ("Geneva", chrono_tz::Europe::Zurich),
    ("London", chrono_tz::Europe::London),
    ("New York", chrono_tz::America::New_York),
    ("Tokyo", chrono_tz::Asia::Tokyo),
    ("Sydney", chrono_tz::Australia::Sydney),
];

const UNKNOWN_CITY: &str = "I don't know.";

#[derive(Default)]
pub struct WorldTimeTool;

impl WorldTimeTool {
    pub fn city_time(&self, city: &str) -> String {
        let city = title_case(city.trim());

        let Some((_, zone)) =
            CITY_ZONES.iter().find(|(name, _)| name.eq_ignore_ascii_case(&city))
        else {
            return UNKNOWN_CITY.to_string();
        };

        let local = Utc::now().with_timezone(zone);
        format!("It is {} in {city}.", local.format("%H:%M"))
    }
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{title_case, WorldTimeTool};

    #[test]
    fn known_city_yields_hh_mm_sentence() {
        let output = WorldTimeTool.city_time("Tokyo");
        assert!(output.starts_with("It is "), "unexpected output: {output}");
        assert!(output.ends_with(" in Tokyo."), "unexpected output: {output}");

        let time_part = &output["It is ".len().."It is 00:00".len()];
        let (hours, minutes) = time_part.split_once(':').expect("HH:mm separator");
        assert!(hours.parse::<u8>().expect("hours") < 24);
        assert!(minutes.parse::<u8>().expect("minutes") < 60);
    }

    #[test]
    fn lookup_normalizes_casing_and_whitespace() {
        let output = WorldTimeTool.city_time("  new york  ");
        assert!(output.ends_with(" in New York."), "unexpected output: {output}");
    }

    #[test]
    fn unknown_city_is_a_content_outcome() {
        assert_eq!(WorldTimeTool.city_time("Atlantis"), "I don't know.");
    }

    #[test]
    fn title_case_handles_multiword_cities() {
        assert_eq!(title_case("NEW york"), "New York");
        assert_eq!(title_case("tokyo"), "Tokyo");
    }
}
