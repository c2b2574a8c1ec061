use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the two fixed positions in a match. Player identities never move
/// between seats; only the role attached to each seat flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    A,
    B,
}

impl Seat {
    pub const BOTH: [Seat; 2] = [Seat::A, Seat::B];

    pub fn index(self) -> usize {
        match self {
            Seat::A => 0,
            Seat::B => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::A => Seat::B,
            Seat::B => Seat::A,
        }
    }
}

/// Acting role for a single round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Shooter,
    Goalkeeper,
}

/// Two-slot role table addressed by role: exactly one seat shoots, the other keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleTable {
    shooter: Seat,
}

impl RoleTable {
    pub fn new(shooter: Seat) -> Self {
        Self { shooter }
    }

    /// Pick the opening shooter uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let shooter = if rng.random_bool(0.5) {
            Seat::A
        } else {
            Seat::B
        };
        Self::new(shooter)
    }

    pub fn shooter(&self) -> Seat {
        self.shooter
    }

    pub fn goalkeeper(&self) -> Seat {
        self.shooter.other()
    }

    pub fn holder(&self, role: Role) -> Seat {
        match role {
            Role::Shooter => self.shooter(),
            Role::Goalkeeper => self.goalkeeper(),
        }
    }

    pub fn role_of(&self, seat: Seat) -> Role {
        if seat == self.shooter {
            Role::Shooter
        } else {
            Role::Goalkeeper
        }
    }

    pub fn swap(&mut self) {
        self.shooter = self.shooter.other();
    }
}
