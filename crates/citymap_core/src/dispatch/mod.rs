//! Chat command dispatch.
//!
//! # Responsibility
//! - Turn command text and button callbacks into store and render calls.
//! - Emit every reply through a transport-provided `ReplySink`.
//!
//! # Invariants
//! - Every map is rendered into a `MapArtifact` that is gone before the
//!   handler returns, whether delivery succeeded or not.
//! - No artifact is created when no requested city resolves.
//! - `DeliveryError::NotModified` is swallowed; other delivery failures are
//!   logged and never retried.
//! - Each request opens its own database connection.

pub mod command;
pub mod replies;
pub mod sink;

use crate::app::AppContext;
use crate::db::DbError;
use crate::model::preference::{MarkerColor, SaveOutcome, UserId};
use crate::render::artifact::MapArtifact;
use crate::repo::city_repo::{CityRepository, SqliteCityRepository};
use crate::repo::preference_repo::SqlitePreferenceRepository;
use crate::repo::RepoError;
use crate::service::map_service::{MapService, MapServiceError, Resolution};
use crate::service::preference_service::PreferenceService;
use command::{Callback, Command};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use sink::{Choice, DeliveryError, DeliveryResult, MessageId, ReplySink};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure that aborted a handler. The user has already been notified.
#[derive(Debug)]
pub enum DispatchError {
    Db(DbError),
    Repo(RepoError),
    Map(MapServiceError),
    Artifact(std::io::Error),
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Map(err) => write!(f, "{err}"),
            Self::Artifact(err) => write!(f, "map artifact error: {err}"),
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Map(err) => Some(err),
            Self::Artifact(err) => Some(err),
        }
    }
}

impl From<DbError> for DispatchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for DispatchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<MapServiceError> for DispatchError {
    fn from(value: MapServiceError) -> Self {
        Self::Map(value)
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(value: std::io::Error) -> Self {
        Self::Artifact(value)
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Who sent a message: the user owning the preferences and the chat that
/// receives replies. Equal in private chats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub user_id: UserId,
    pub chat_id: UserId,
}

impl Requester {
    pub fn private(user_id: UserId) -> Self {
        Self {
            user_id,
            chat_id: user_id,
        }
    }
}

/// A button press on an earlier message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Requester,
    pub message_id: MessageId,
    pub data: String,
}

enum MapDelivery {
    Sent,
    SendFailed,
    NotRendered,
}

pub struct Dispatcher<'ctx> {
    context: &'ctx AppContext,
}

impl<'ctx> Dispatcher<'ctx> {
    pub fn new(context: &'ctx AppContext) -> Self {
        Self { context }
    }

    /// Handles one incoming text message. Plain text and unknown commands
    /// are ignored.
    pub fn handle_message(
        &self,
        from: Requester,
        text: &str,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let Some(command) = Command::parse(text) else {
            debug!("event=message_ignored module=dispatch status=skip user_id={}", from.user_id);
            return Ok(());
        };
        let command_name = command.name();
        info!(
            "event=command_received module=dispatch status=ok command={command_name} user_id={}",
            from.user_id
        );

        let result = match command {
            Command::Start => {
                deliver(sink.send_text(from.chat_id, replies::GREETING), "reply_send");
                Ok(())
            }
            Command::Help => {
                deliver(sink.send_text(from.chat_id, replies::HELP), "reply_send");
                Ok(())
            }
            Command::ShowCity(city) => self.show_city(from, city, sink),
            Command::RememberCity(city) => self.remember_city(from, city, sink),
            Command::ShowMyCities => self.show_my_cities(from, sink),
            Command::DeleteMyCity => self.delete_my_city(from, sink),
            Command::SetMarkerColor => self.set_marker_color(from, sink),
        };

        if let Err(err) = &result {
            error!(
                "event=command_failed module=dispatch status=error command={command_name} user_id={} error={err}",
                from.user_id
            );
            deliver(sink.send_text(from.chat_id, replies::INTERNAL_ERROR), "reply_send");
        }
        result
    }

    /// Handles one button press. Unrecognised payloads are ignored.
    pub fn handle_callback(
        &self,
        query: &CallbackQuery,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let Some(callback) = Callback::parse(&query.data) else {
            debug!(
                "event=callback_ignored module=dispatch status=skip user_id={}",
                query.from.user_id
            );
            return Ok(());
        };

        let result = match &callback {
            Callback::DeleteCity(city) => self.on_delete_city(query, city, sink),
            Callback::SetColor(code) => self.on_set_color(query, code, sink),
        };

        if let Err(err) = &result {
            error!(
                "event=callback_failed module=dispatch status=error user_id={} error={err}",
                query.from.user_id
            );
            deliver(
                sink.answer_callback(&query.id, replies::INTERNAL_ERROR, true),
                "callback_answer",
            );
        }
        result
    }

    fn show_city(
        &self,
        from: Requester,
        city: Option<String>,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let Some(city) = city else {
            deliver(sink.send_text(from.chat_id, replies::SHOW_CITY_USAGE), "reply_send");
            return Ok(());
        };

        let mut conn = self.context.open_connection()?;
        let color = preferences(&mut conn)?.get_marker_color(from.user_id)?;
        let maps = MapService::new(SqliteCityRepository::try_new(&conn)?, self.context.renderer());
        let resolution = maps.resolve(std::slice::from_ref(&city))?;
        if resolution.is_empty() {
            deliver(
                sink.send_text(from.chat_id, &replies::unknown_city(&city)),
                "reply_send",
            );
            return Ok(());
        }

        let status = deliver(
            sink.send_text(from.chat_id, &replies::show_city_status(&city)),
            "status_send",
        );
        let delivery = self.deliver_map(
            &maps,
            from,
            &city,
            resolution,
            color,
            &replies::show_city_caption(&city),
            sink,
        )?;
        settle_status(from, status, delivery, &replies::show_city_failed(&city), sink);
        Ok(())
    }

    fn show_my_cities(&self, from: Requester, sink: &mut dyn ReplySink) -> DispatchResult<()> {
        let mut conn = self.context.open_connection()?;
        let (cities, color) = {
            let store = preferences(&mut conn)?;
            (
                store.list_saved_cities(from.user_id)?,
                store.get_marker_color(from.user_id)?,
            )
        };
        if cities.is_empty() {
            deliver(sink.send_text(from.chat_id, replies::NO_SAVED_CITIES), "reply_send");
            return Ok(());
        }

        let status = deliver(
            sink.send_text(from.chat_id, replies::MY_CITIES_STATUS),
            "status_send",
        );
        let maps = MapService::new(SqliteCityRepository::try_new(&conn)?, self.context.renderer());
        let resolution = maps.resolve(&cities)?;
        let delivery = self.deliver_map(
            &maps,
            from,
            "my_cities",
            resolution,
            color,
            replies::MY_CITIES_CAPTION,
            sink,
        )?;
        settle_status(from, status, delivery, replies::MY_CITIES_FAILED, sink);
        Ok(())
    }

    fn remember_city(
        &self,
        from: Requester,
        city: Option<String>,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let Some(city) = city else {
            deliver(sink.send_text(from.chat_id, replies::REMEMBER_CITY_USAGE), "reply_send");
            return Ok(());
        };

        let mut conn = self.context.open_connection()?;
        let outcome = preferences(&mut conn)?.save_city(from.user_id, &city)?;
        let reply = match outcome {
            SaveOutcome::Saved => replies::city_saved(&city),
            SaveOutcome::AlreadySaved => replies::city_already_saved(&city),
            SaveOutcome::UnknownCity => replies::unknown_city(&city),
        };
        deliver(sink.send_text(from.chat_id, &reply), "reply_send");
        Ok(())
    }

    fn delete_my_city(&self, from: Requester, sink: &mut dyn ReplySink) -> DispatchResult<()> {
        let mut conn = self.context.open_connection()?;
        let cities = preferences(&mut conn)?.list_saved_cities(from.user_id)?;
        if cities.is_empty() {
            deliver(sink.send_text(from.chat_id, replies::NOTHING_TO_DELETE), "reply_send");
        } else {
            deliver(
                sink.send_choices(from.chat_id, replies::DELETE_PROMPT, &delete_choices(&cities)),
                "reply_send",
            );
        }
        Ok(())
    }

    fn set_marker_color(&self, from: Requester, sink: &mut dyn ReplySink) -> DispatchResult<()> {
        let mut conn = self.context.open_connection()?;
        let current = preferences(&mut conn)?.get_marker_color(from.user_id)?;
        let choices = MarkerColor::ALL
            .into_iter()
            .map(|color| {
                Choice::new(color.label(), Callback::SetColor(color.code().to_string()).to_data())
            })
            .collect::<Vec<_>>();
        deliver(
            sink.send_choices(from.chat_id, &replies::color_prompt(current), &choices),
            "reply_send",
        );
        Ok(())
    }

    fn on_delete_city(
        &self,
        query: &CallbackQuery,
        city: &str,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let user_id = query.from.user_id;
        let mut conn = self.context.open_connection()?;
        let mut store = preferences(&mut conn)?;
        let deleted = store.delete_city(user_id, city)?;
        let remaining = store.list_saved_cities(user_id)?;

        let (notice, alert) = if deleted {
            (replies::city_deleted(city), false)
        } else {
            (replies::city_not_deleted(city), true)
        };
        deliver(sink.answer_callback(&query.id, &notice, alert), "callback_answer");

        let refreshed = match (remaining.is_empty(), deleted) {
            (true, true) => sink.edit_text(
                query.from.chat_id,
                query.message_id,
                replies::ALL_CITIES_DELETED,
                &[],
            ),
            (true, false) => sink.edit_text(
                query.from.chat_id,
                query.message_id,
                replies::NO_CITIES_LEFT,
                &[],
            ),
            (false, true) => sink.edit_text(
                query.from.chat_id,
                query.message_id,
                replies::DELETE_LIST_UPDATED,
                &delete_choices(&remaining),
            ),
            (false, false) => sink.edit_text(
                query.from.chat_id,
                query.message_id,
                replies::DELETE_PROMPT,
                &delete_choices(&remaining),
            ),
        };
        deliver(refreshed, "list_refresh");
        Ok(())
    }

    fn on_set_color(
        &self,
        query: &CallbackQuery,
        code: &str,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<()> {
        let Ok(color) = code.parse::<MarkerColor>() else {
            warn!(
                "event=marker_color_set module=dispatch status=skip reason=unknown_color user_id={}",
                query.from.user_id
            );
            deliver(
                sink.answer_callback(&query.id, replies::UNKNOWN_COLOR, true),
                "callback_answer",
            );
            return Ok(());
        };

        let mut conn = self.context.open_connection()?;
        preferences(&mut conn)?.set_marker_color(query.from.user_id, color)?;
        deliver(
            sink.answer_callback(&query.id, &replies::color_set_notice(color), false),
            "callback_answer",
        );
        deliver(
            sink.edit_text(
                query.from.chat_id,
                query.message_id,
                &replies::color_set_message(color),
                &[],
            ),
            "list_refresh",
        );
        Ok(())
    }

    /// Renders into a fresh artifact, uploads it, and removes it.
    #[allow(clippy::too_many_arguments)]
    fn deliver_map<C: CityRepository>(
        &self,
        maps: &MapService<'_, C>,
        from: Requester,
        target: &str,
        resolution: Resolution,
        color: MarkerColor,
        caption: &str,
        sink: &mut dyn ReplySink,
    ) -> DispatchResult<MapDelivery> {
        if resolution.is_empty() {
            return Ok(MapDelivery::NotRendered);
        }

        let artifact = MapArtifact::create(self.context.artifact_dir(), from.user_id, target)?;
        let outcome = match maps.render_resolved(artifact.path(), resolution, color) {
            Ok(outcome) => outcome,
            Err(MapServiceError::Render(err)) => {
                error!(
                    "event=map_render module=dispatch status=error user_id={} error={err}",
                    from.user_id
                );
                return Ok(MapDelivery::NotRendered);
            }
            Err(err) => return Err(err.into()),
        };
        if !outcome.is_rendered() {
            return Ok(MapDelivery::NotRendered);
        }

        let sent = sink.send_photo(from.chat_id, artifact.path(), caption);
        if let Err(err) = artifact.close() {
            warn!("event=artifact_cleanup module=dispatch status=error error={err}");
        }

        match sent {
            Ok(_) => {
                info!("event=map_delivery module=dispatch status=ok user_id={}", from.user_id);
                Ok(MapDelivery::Sent)
            }
            Err(err) => {
                warn!(
                    "event=map_delivery module=dispatch status=error user_id={} error={err}",
                    from.user_id
                );
                deliver(sink.send_text(from.chat_id, replies::DELIVERY_FAILED), "reply_send");
                Ok(MapDelivery::SendFailed)
            }
        }
    }
}

fn preferences(
    conn: &mut Connection,
) -> DispatchResult<PreferenceService<SqlitePreferenceRepository<'_>>> {
    Ok(PreferenceService::new(SqlitePreferenceRepository::try_new(conn)?))
}

fn delete_choices(cities: &[String]) -> Vec<Choice> {
    cities
        .iter()
        .map(|city| Choice::new(format!("❌ {city}"), Callback::DeleteCity(city.clone()).to_data()))
        .collect()
}

/// Removes the "drawing..." message, or turns it into the failure reply.
fn settle_status(
    from: Requester,
    status: Option<MessageId>,
    delivery: MapDelivery,
    failure_text: &str,
    sink: &mut dyn ReplySink,
) {
    match (delivery, status) {
        (MapDelivery::Sent | MapDelivery::SendFailed, Some(message_id)) => {
            deliver(sink.delete_message(from.chat_id, message_id), "status_delete");
        }
        (MapDelivery::Sent | MapDelivery::SendFailed, None) => {}
        (MapDelivery::NotRendered, Some(message_id)) => {
            deliver(
                sink.edit_text(from.chat_id, message_id, failure_text, &[]),
                "status_edit",
            );
        }
        (MapDelivery::NotRendered, None) => {
            deliver(sink.send_text(from.chat_id, failure_text), "reply_send");
        }
    }
}

/// Unwraps a delivery result, logging transport failures.
fn deliver<T>(result: DeliveryResult<T>, event: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(DeliveryError::NotModified) => None,
        Err(err) => {
            warn!("event={event} module=dispatch status=error error={err}");
            None
        }
    }
}
