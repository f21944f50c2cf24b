use ballot_session::SessionSnapshot;
use ballot_sync::Audience;
use ballot_types::Role;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Route {
    #[default]
    Home,
    Admin,
    Voter,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Home, Route::Admin, Route::Voter];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Admin => "/admin",
            Self::Voter => "/vote",
        }
    }

    /// Whether `session` may view this route.
    pub fn permits(&self, session: &SessionSnapshot) -> bool {
        match self {
            Self::Home => true,
            Self::Admin => session.role() == Some(Role::Admin),
            // A connection always carries a bound gateway.
            Self::Voter => session.is_connected(),
        }
    }

    /// The synchronizer audience a dashboard route needs; Home has none.
    pub fn audience(&self) -> Option<Audience> {
        match self {
            Self::Home => None,
            Self::Admin => Some(Audience::Admin),
            Self::Voter => Some(Audience::Voter),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for Route {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_end_matches('/') {
            "" => Ok(Self::Home),
            "/admin" => Ok(Self::Admin),
            "/vote" => Ok(Self::Voter),
            _ => Err(format!("no route for {s:?}")),
        }
    }
}
