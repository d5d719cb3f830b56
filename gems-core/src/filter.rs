//! Rejects chain establishments and unnamed placeholders.
//!
//! Chain names are matched case-insensitively as whole words, so `Chevron`
//! rejects "Chevron Station" but not "Chevrons Ridge". Names carrying a
//! generic franchise marker ("branch", "location", a trailing `#12` store
//! number) are rejected even when the brand is not in the list.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::Place;

/// Known chains and franchises, grouped by trade.
///
/// Brands whose names are also ordinary place words are left out, since
/// whole-word matching would reject "Shell Beach" or "Lucky Point".
/// See [`AMBIGUOUS_BRANDS`].
pub const CHAIN_GROUPS: &[(&str, &[&str])] = &[
    (
        "coffee",
        &[
            "Starbucks",
            "Peet's Coffee",
            "Coffee Bean & Tea Leaf",
            "Dunkin'",
            "Dunkin Donuts",
            "Dutch Bros",
            "Philz Coffee",
            "Blue Bottle Coffee",
            "Intelligentsia",
            "Verve Coffee",
            "Costa Coffee",
            "Caribou Coffee",
            "Tim Hortons",
            "McCafe",
            "Equator Coffees",
        ],
    ),
    (
        "fast food",
        &[
            "McDonald's",
            "McDonalds",
            "Burger King",
            "Wendy's",
            "In-N-Out",
            "Five Guys",
            "Jack in the Box",
            "Carl's Jr",
            "Carls Jr",
            "Hardee's",
            "Taco Bell",
            "Del Taco",
            "KFC",
            "Popeyes",
            "Chick-fil-A",
            "Subway",
            "Jimmy John's",
            "Jersey Mike's",
            "Arby's",
            "Sonic Drive-In",
            "Whataburger",
            "White Castle",
            "Wingstop",
            "Little Caesars",
            "Domino's",
            "Pizza Hut",
            "Papa John's",
            "Round Table Pizza",
            "Sbarro",
            "Dairy Queen",
            "El Pollo Loco",
            "Wienerschnitzel",
            "Rally's",
            "Checkers",
            "Church's Chicken",
            "Long John Silver's",
            "A&W",
        ],
    ),
    (
        "casual dining",
        &[
            "Applebee's",
            "Chili's",
            "TGI Fridays",
            "Olive Garden",
            "Red Lobster",
            "Outback Steakhouse",
            "Cheesecake Factory",
            "P.F. Chang's",
            "BJ's Restaurant",
            "Buffalo Wild Wings",
            "Yard House",
            "California Pizza Kitchen",
            "Denny's",
            "IHOP",
            "Waffle House",
            "Cracker Barrel",
            "Bob Evans",
            "Red Robin",
            "Bonefish Grill",
            "Ruby Tuesday",
            "Uno Pizzeria & Grill",
            "Dave & Buster's",
            "Hard Rock Cafe",
            "Rainforest Cafe",
            "Hooters",
            "Claim Jumper",
            "Mimi's Cafe",
            "Black Angus",
            "Sizzler",
            "Golden Corral",
            "Marie Callender's",
            "Sweet Tomatoes",
            "Souplantation",
            "Hometown Buffet",
            "Old Spaghetti Factory",
            "Romano's Macaroni Grill",
            "Maggiano's Little Italy",
            "Carrabba's Italian Grill",
            "Buca di Beppo",
            "Benihana",
            "Joe's Crab Shack",
            "Texas Roadhouse",
            "LongHorn Steakhouse",
            "Chevy's",
            "Chevy's Fresh Mex",
            "Chevys Fresh Mex",
            "Bubba Gump Shrimp Co.",
            "Ruth's Chris Steak House",
            "Morton's Steakhouse",
            "Chart House",
            "Lucille's BBQ",
            "Lucille's Smokehouse BBQ",
            "Famous Dave's",
            "Black Bear Diner",
            "Coco's Bakery",
            "Chuck E. Cheese",
            "El Torito",
            "Acapulco Restaurant",
        ],
    ),
    (
        "fast casual",
        &[
            "Chipotle",
            "Qdoba",
            "Panera Bread",
            "Panda Express",
            "Noodles & Company",
            "Shake Shack",
            "Sweetgreen",
            "Tender Greens",
            "Rubio's",
            "Rubio's Coastal Grill",
            "The Habit Burger Grill",
            "Firehouse Subs",
            "Jason's Deli",
            "McAlister's Deli",
            "Corner Bakery",
            "Au Bon Pain",
            "Veggie Grill",
            "Mendocino Farms",
            "Blaze Pizza",
            "MOD Pizza",
            "Pieology",
            "Which Wich",
            "Potbelly Sandwich Shop",
            "Newk's Eatery",
            "Zoup!",
            "Café Zupas",
            "Freddy's Frozen Custard & Steakburgers",
            "Smashburger",
            "MOOYAH",
            "Culver's",
            "Portillo's",
            "Raising Cane's",
            "Baja Fresh",
            "Wahoo's Fish Taco",
            "Taco Cabana",
            "Moe's Southwest Grill",
            "Tijuana Flats",
            "Freebirds World Burrito",
            "Fazoli's",
            "Nando's Peri-Peri",
            "Zaxby's",
            "Waba Grill",
            "Yoshinoya",
            "Noah's Bagels",
            "Einstein Bros. Bagels",
            "Bruegger's Bagels",
            "Krispy Kreme",
            "Pret A Manger",
            "Jamba Juice",
            "Smoothie King",
            "Tropical Smoothie Cafe",
            "Robeks",
        ],
    ),
    (
        "retail",
        &[
            "Walmart",
            "Costco",
            "Sam's Club",
            "IKEA",
            "Barnes & Noble",
            "Bass Pro Shops",
            "Cabela's",
            "Whole Foods Market",
            "Trader Joe's",
            "Safeway",
            "Vons",
            "Albertsons",
            "Kroger",
            "Ralph's",
            "Ralphs",
            "Food 4 Less",
            "Aldi",
            "Sprouts Farmers Market",
            "Gelson's",
            "Bristol Farms",
            "Raley's",
            "Save Mart",
            "Nob Hill Foods",
            "WinCo Foods",
            "Smart & Final",
            "Grocery Outlet",
            "99 Ranch Market",
            "H Mart",
            "Mitsuwa Marketplace",
            "Nijiya Market",
            "Marukai Market",
        ],
    ),
    (
        "dessert",
        &[
            "Baskin-Robbins",
            "Cold Stone Creamery",
            "Ben & Jerry's",
            "Haagen-Dazs",
            "Yogurtland",
            "Pinkberry",
            "Menchie's",
            "Sweet Frog",
            "Tutti Frutti",
            "Cinnabon",
            "Auntie Anne's",
            "Wetzel's Pretzels",
            "Mrs. Fields",
            "Nothing Bundt Cakes",
            "Edible Arrangements",
            "Crumbl Cookies",
            "Insomnia Cookies",
            "See's Candies",
            "Godiva",
            "Rocky Mountain Chocolate Factory",
            "Ghirardelli Chocolate",
            "It's Sugar",
            "Mallow Mallow",
            "Somi Somi",
            "Salt & Straw",
            "Boba Guys",
            "Kung Fu Tea",
            "Gong Cha",
            "Happy Lemon",
            "Ding Tea",
            "Sharetea",
            "CoCo Fresh Tea & Juice",
            "Tastea",
            "85°C Bakery Cafe",
            "Paris Baguette",
            "Tous les Jours",
            "Beard Papa's",
            "Orange Julius",
            "Nekter Juice Bar",
            "Juice It Up!",
            "Planet Smoothie",
        ],
    ),
    (
        "regional",
        &[
            "In-N-Out Burger",
            "Fatburger",
            "Original Tommy's",
            "Umami Burger",
            "Super Duper Burgers",
            "Boudin Bakery",
            "La Boulangerie",
            "Specialty's Café & Bakery",
            "Urth Caffé",
            "Le Pain Quotidien",
            "Ike's Love & Sandwiches",
            "Erik's DeliCafe",
            "Togo's",
            "Habit Burger",
            "Zankou Chicken",
            "Flame Broiler",
            "L&L Hawaiian BBQ",
            "Ono Hawaiian BBQ",
            "BJ's Restaurant & Brewhouse",
            "Lazy Dog Restaurant & Bar",
            "Eureka!",
            "Gordon Biersch",
            "Rock & Brews",
            "Pressed Juicery",
            "Vitality Bowls",
            "Urban Plates",
            "Asian Box",
            "Native Foods",
            "Mixt",
            "The Plant Cafe",
            "Amy's Drive Thru",
            "Mary's Pizza Shack",
        ],
    ),
    (
        "fuel",
        &[
            "7-Eleven",
            "ampm",
            "ARCO",
            "Chevron",
            "Circle K",
            "Mobil",
            "Exxon",
            "Valero",
            "Texaco",
            "Casey's",
            "Wawa",
            "Sheetz",
            "QuikTrip",
            "RaceTrac",
            "Kum & Go",
            "Flying J",
            "Love's",
            "Kwik Trip",
            "Kwik Star",
            "GetGo",
            "Maverik",
            "Sinclair",
            "Phillips 66",
            "Sunoco",
            "BP",
            "Citgo",
            "Cumberland Farms",
            "Thorntons",
        ],
    ),
    (
        "pharmacy",
        &[
            "CVS",
            "Walgreens",
            "Rite Aid",
            "Duane Reade",
            "Bartell Drugs",
        ],
    ),
];

/// Chain brands deliberately absent from [`CHAIN_GROUPS`]. Each doubles
/// as a word in real Californian place names.
pub const AMBIGUOUS_BRANDS: &[&str] = &[
    "76",
    "Curry House",
    "Holiday",
    "Lemonade",
    "Lucky",
    "Marathon",
    "Pilot",
    "Quickly",
    "Round Table",
    "Shell",
    "Speedway",
    "T4",
    "Target",
    "The Counter",
    "Tommy's",
];

/// Words and suffixes that flag a franchise outlet regardless of brand.
static CHAIN_INDICATOR: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"\b(?:franchise|chain|location|branch)\b|#\d+\s*$")
});

/// Placeholder names mappers use when a feature has no real name.
static PLACEHOLDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?:unnamed|(?:unknown|no name|unlabeled|untitled|generic|nameless)\b)")
});

/// One pattern per chain, each anchored on non-word characters so brands
/// ending in punctuation such as `Dunkin'` still match as whole words.
static CHAIN_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    all_chains()
        .into_iter()
        .map(|chain| {
            let pattern = format!(r"(?:^|\W){}(?:\W|$)", regex::escape(&chain.to_lowercase()));
            (chain, compile(&pattern))
        })
        .collect()
});

#[expect(
    clippy::expect_used,
    reason = "patterns are compile-time constants or escaped literals"
)]
fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("filter pattern is valid")
}

/// Every chain name, sorted and without duplicates.
#[must_use]
pub fn all_chains() -> Vec<&'static str> {
    CHAIN_GROUPS
        .iter()
        .flat_map(|(_, chains)| chains.iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The first known chain found in `name`, if any.
///
/// # Examples
///
/// ```
/// use gems_core::matched_chain;
///
/// assert_eq!(matched_chain("Starbucks Coffee"), Some("Starbucks"));
/// assert_eq!(matched_chain("Joe's Local Diner"), None);
/// ```
#[must_use]
pub fn matched_chain(name: &str) -> Option<&'static str> {
    let normalised = name.trim().to_lowercase();
    if normalised.is_empty() {
        return None;
    }
    CHAIN_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(&normalised))
        .map(|(chain, _)| *chain)
}

/// Whether `name` belongs to a chain or franchise outlet.
///
/// # Examples
///
/// ```
/// use gems_core::is_chain_establishment;
///
/// assert!(is_chain_establishment("starbucks coffee"));
/// assert!(is_chain_establishment("Corner Market #42"));
/// assert!(!is_chain_establishment("Joe's Local Diner"));
/// ```
#[must_use]
pub fn is_chain_establishment(name: &str) -> bool {
    let normalised = name.trim().to_lowercase();
    if normalised.is_empty() {
        return false;
    }
    matched_chain(&normalised).is_some() || CHAIN_INDICATOR.is_match(&normalised)
}

/// Whether `name` is missing or a generic placeholder.
///
/// # Examples
///
/// ```
/// use gems_core::is_unnamed_place;
///
/// assert!(is_unnamed_place(""));
/// assert!(is_unnamed_place("Unnamed Trailhead"));
/// assert!(!is_unnamed_place("Sierra Vista Point"));
/// ```
#[must_use]
pub fn is_unnamed_place(name: &str) -> bool {
    let normalised = name.trim().to_lowercase();
    normalised.is_empty() || PLACEHOLDER_NAME.is_match(&normalised)
}

/// Why a name was rejected by [`filter_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    /// The name is missing or a placeholder.
    #[serde(rename = "unnamed_place")]
    Unnamed,
    /// The name belongs to a chain or franchise.
    ChainEstablishment,
}

/// Outcome of the place filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// The place may proceed.
    Keep,
    /// The place must be dropped.
    Reject(FilterReason),
}

impl FilterDecision {
    /// Whether the decision drops the place.
    #[must_use]
    pub const fn is_reject(self) -> bool {
        matches!(self, Self::Reject(_))
    }

    /// Rejection reason, if any.
    #[must_use]
    pub const fn reason(self) -> Option<FilterReason> {
        match self {
            Self::Keep => None,
            Self::Reject(reason) => Some(reason),
        }
    }
}

/// Apply both name checks. Placeholder names win over chain matches.
#[must_use]
pub fn filter_name(name: &str) -> FilterDecision {
    if is_unnamed_place(name) {
        FilterDecision::Reject(FilterReason::Unnamed)
    } else if is_chain_establishment(name) {
        FilterDecision::Reject(FilterReason::ChainEstablishment)
    } else {
        FilterDecision::Keep
    }
}

/// [`filter_name`] applied to a place's name.
#[must_use]
pub fn filter_place(place: &Place) -> FilterDecision {
    filter_name(&place.name)
}
