/// Codeforces rank tiers from lowest to highest. Only used for ordering.
pub const RANK_ORDER: [&str; 11] = [
    "unrated",
    "newbie",
    "pupil",
    "specialist",
    "expert",
    "candidate master",
    "master",
    "international master",
    "grandmaster",
    "international grandmaster",
    "legendary grandmaster",
];

pub const UNRATED: &str = "unrated";
pub const LEGENDARY_GRANDMASTER: &str = "legendary grandmaster";

/// Upper-exclusive rating bounds for each rated tier.
const RATING_BANDS: [(i64, &str); 9] = [
    (1200, "newbie"),
    (1400, "pupil"),
    (1600, "specialist"),
    (1900, "expert"),
    (2100, "candidate master"),
    (2300, "master"),
    (2400, "international master"),
    (2600, "grandmaster"),
    (3000, "international grandmaster"),
];

/// Position of `rank` in [`RANK_ORDER`], or -1 for anything unknown.
pub fn rank_index(rank: &str) -> i32 {
    RANK_ORDER
        .iter()
        .position(|r| r.eq_ignore_ascii_case(rank))
        .map_or(-1, |i| i as i32)
}

pub fn rank_for_rating(rating: i64) -> &'static str {
    RATING_BANDS
        .iter()
        .find(|(bound, _)| rating < *bound)
        .map_or(LEGENDARY_GRANDMASTER, |&(_, rank)| rank)
}

/// "candidate master" -> "Candidate Master".
pub fn title_case(rank: &str) -> String {
    rank.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
