//! Player identity and administration payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::PlayerEntity,
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_phone},
    },
    leaderboard::model::Player,
};

const MAX_LABEL_CHARS: usize = 64;

/// Phone-number lookup of an already registered player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Phone number in any common format.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

/// Registration of a new player by an administrator.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterPlayerRequest {
    /// Display name.
    #[validate(custom(function = "validate_not_blank"), length(max = 64))]
    pub name: String,
    /// Phone number, stored normalised as the player id.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    /// Optional team; blank means no team.
    #[serde(default)]
    #[validate(length(max = 64))]
    pub team: Option<String>,
}

/// Partial update of a player. Scores are never touched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlayerRequest {
    /// New display name; omitted keeps the current one.
    #[serde(default)]
    pub name: Option<String>,
    /// If not specified, keeps the current team.
    /// If null or blank, removes the player from their team.
    /// If a string is specified, moves the player to that team.
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub team: Option<Option<String>>,
}

impl Validate for UpdatePlayerRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.name {
            if let Err(e) = validate_not_blank(name) {
                errors.add("name", e);
            } else if name.chars().count() > MAX_LABEL_CHARS {
                errors.add("name", too_long());
            }
        }

        if let Some(Some(ref team)) = self.team {
            if team.chars().count() > MAX_LABEL_CHARS {
                errors.add("team", too_long());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn too_long() -> ValidationError {
    let mut err = ValidationError::new("length");
    err.message = Some(format!("Value must be at most {MAX_LABEL_CHARS} characters").into());
    err
}

/// Public projection of a registered player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Team label, `null` without a team.
    pub team: Option<String>,
    /// RFC 3339 registration time when known.
    pub joined_at: Option<String>,
}

impl From<&Player> for PlayerSummary {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            display_name: player.display_name.clone(),
            team: player.team.clone(),
            joined_at: player.joined_at.map(format_system_time),
        }
    }
}

impl TryFrom<PlayerEntity> for PlayerSummary {
    type Error = &'static str;

    fn try_from(entity: PlayerEntity) -> Result<Self, Self::Error> {
        Player::try_from(entity).map(|player| Self::from(&player))
    }
}

/// Session opened by a successful phone login.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Logged-in player.
    pub player: PlayerSummary,
    /// Game the session belongs to.
    pub game_id: String,
}

/// Joined players of the game.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayersResponse {
    /// Number of joined players.
    pub count: usize,
    /// Players in registration order.
    pub players: Vec<PlayerSummary>,
}

/// Distinct team labels in use.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamsResponse {
    /// Labels sorted alphabetically.
    pub teams: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn update_distinguishes_absent_and_null_team() {
        let keep: UpdatePlayerRequest = serde_json::from_value(json!({"name": "Jo"})).unwrap();
        assert_eq!(keep.team, None);

        let clear: UpdatePlayerRequest = serde_json::from_value(json!({"team": null})).unwrap();
        assert_eq!(clear.team, Some(None));

        let set: UpdatePlayerRequest = serde_json::from_value(json!({"team": "Hawks"})).unwrap();
        assert_eq!(set.team, Some(Some("Hawks".into())));
    }

    #[test]
    fn update_rejects_blank_name_but_allows_clearing_team() {
        let blank: UpdatePlayerRequest =
            serde_json::from_value(json!({"name": " ", "team": null})).unwrap();
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(!errors.field_errors().contains_key("team"));
    }

    #[test]
    fn registration_requires_name_and_valid_phone() {
        let request = RegisterPlayerRequest {
            name: " ".into(),
            phone: "12".into(),
            team: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("phone"));
    }
}
