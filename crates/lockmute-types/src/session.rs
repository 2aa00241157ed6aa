//! Session records and handles.

/// One row of the session manager's session listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Session identifier, e.g. `"2"` or `"c1"`.
    pub id: String,
    /// Owning user id.
    pub uid: u32,
    /// Owning user name.
    pub user: String,
    /// Seat the session is attached to; empty for seatless sessions.
    pub seat: String,
    /// Bus object path of the session.
    pub path: String,
}

impl SessionRecord {
    /// Whether the session is attached to a seat.
    pub fn has_seat(&self) -> bool {
        !self.seat.is_empty()
    }

    /// Handle referring to this session.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id.clone(),
            path: self.path.clone(),
        }
    }
}

/// Opaque reference to exactly one interactive session.
///
/// Resolved once at startup and held for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: String,
    pub path: String,
}

impl std::fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.path)
    }
}

/// Value of a session's `Type` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionKind {
    X11,
    Wayland,
    Mir,
    Tty,
    Unspecified,
    Other(String),
}

impl SessionKind {
    /// Parse the textual session type reported by the session manager.
    pub fn parse(value: &str) -> Self {
        match value {
            "x11" => Self::X11,
            "wayland" => Self::Wayland,
            "mir" => Self::Mir,
            "tty" => Self::Tty,
            "unspecified" | "" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }

    /// Display-server session types.
    pub fn is_graphical(&self) -> bool {
        matches!(self, Self::X11 | Self::Wayland | Self::Mir)
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::X11 => write!(f, "x11"),
            Self::Wayland => write!(f, "wayland"),
            Self::Mir => write!(f, "mir"),
            Self::Tty => write!(f, "tty"),
            Self::Unspecified => write!(f, "unspecified"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}
