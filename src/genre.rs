use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicase::UniCase;

macro_rules! genres {
    ($($variant:ident => $name:literal,)*) => {
        /// The closed genre vocabulary used by movie pages.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
        pub enum Genre {
            $(#[serde(rename = $name)] $variant,)*
        }

        impl Genre {
            pub const ALL: &'static [Genre] = &[$(Genre::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Genre::$variant => $name,)*
                }
            }
        }
    };
}

genres! {
    Action => "Action",
    Adventure => "Adventure",
    Animation => "Animation",
    British => "British",
    Comedy => "Comedy",
    Crime => "Crime",
    Disaster => "Disaster",
    Documentary => "Documentary",
    Drama => "Drama",
    Eastern => "Eastern",
    Erotic => "Erotic",
    Family => "Family",
    FanFilm => "Fan Film",
    Fantasy => "Fantasy",
    FilmNoir => "Film Noir",
    Foreign => "Foreign",
    History => "History",
    Holiday => "Holiday",
    Horror => "Horror",
    Indie => "Indie",
    Kids => "Kids",
    Music => "Music",
    Musical => "Musical",
    Mystery => "Mystery",
    NeoNoir => "Neo-noir",
    RoadMovie => "Road Movie",
    Romance => "Romance",
    ScienceFiction => "Science Fiction",
    Short => "Short",
    Sport => "Sport",
    SportingEvent => "Sporting Event",
    SportsFilm => "Sports Film",
    Suspense => "Suspense",
    TvMovie => "TV Movie",
    Thriller => "Thriller",
    War => "War",
    Western => "Western",
}

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = UniCase::new(s.trim());
        Genre::ALL
            .iter()
            .copied()
            .find(|genre| UniCase::new(genre.name()) == wanted)
            .ok_or_else(|| UnknownGenre(s.trim().into()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Error)]
#[error("unknown genre: {0}")]
pub struct UnknownGenre(pub String);
