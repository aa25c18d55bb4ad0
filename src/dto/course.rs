use serde::Serialize;
use utoipa::ToSchema;

use crate::{config::AppConfig, leaderboard::model::Stop};

/// One stop of the crawl as shown to players.
#[derive(Debug, Serialize, ToSchema)]
pub struct StopDto {
    /// Stop id used in score submissions.
    pub id: String,
    /// Bar name.
    pub name: String,
    /// Drink to finish at this stop.
    pub drink: String,
    /// Icon shown next to the stop.
    pub emoji: String,
    /// Expected number of sips.
    pub par: u32,
    /// Play order of the stop.
    pub sequence_index: u32,
}

impl From<&Stop> for StopDto {
    fn from(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            drink: stop.drink.clone(),
            emoji: stop.emoji.clone(),
            par: stop.par,
            sequence_index: stop.sequence_index,
        }
    }
}

/// Static course of the running game, stops in play order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    /// Game the course belongs to.
    pub game_id: String,
    /// Display title of the event.
    pub title: String,
    /// Sum of every stop par.
    pub total_par: u32,
    /// Stops in play order.
    pub stops: Vec<StopDto>,
    /// Lowest value a submission is clamped to.
    pub strokes_min: u32,
    /// Highest value a submission is clamped to.
    pub strokes_max: u32,
}

impl From<&AppConfig> for CourseResponse {
    fn from(config: &AppConfig) -> Self {
        let stops = config.course.stops();
        Self {
            game_id: config.game_id.to_string(),
            title: config.title.clone(),
            total_par: stops.iter().map(|stop| stop.par).sum(),
            stops: stops.iter().map(StopDto::from).collect(),
            strokes_min: config.strokes.min,
            strokes_max: config.strokes.max,
        }
    }
}
