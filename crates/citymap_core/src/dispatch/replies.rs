//! User-facing reply texts.

use crate::model::preference::MarkerColor;

pub const GREETING: &str =
    "👋 Hi! I can show cities on a map. Send /help for the list of commands.";

pub const HELP: &str = "📚 Available commands:\n\
/start - Greeting\n\
/help - Show this message\n\
/remember_city <CityName> - Save a city to your list (in English, e.g. New York).\n\
/show_city <CityName> - Show a map with the given city (in English).\n\
/show_my_cities - Show a map with all your saved cities.\n\
/delete_my_city - Remove a city from your saved list.\n\
/set_marker_color - Choose the marker color for your maps.";

pub const SHOW_CITY_USAGE: &str =
    "❓ Please put a city name after the command. For example: /show_city London";
pub const REMEMBER_CITY_USAGE: &str =
    "❓ Please put a city name after the command. For example: /remember_city Paris";

pub const NO_SAVED_CITIES: &str =
    "😞 You have not saved any cities yet. Use /remember_city <CityName>.";
pub const MY_CITIES_STATUS: &str =
    "🌍 Drawing a map of all your saved cities... This may take a few seconds.";
pub const MY_CITIES_CAPTION: &str = "✅ Map of your saved cities";
pub const MY_CITIES_FAILED: &str =
    "❌ Could not draw the map. Your saved cities may have no coordinate data.";

pub const DELIVERY_FAILED: &str = "❌ Something went wrong while sending the map.";
pub const INTERNAL_ERROR: &str = "❌ Something went wrong. Please try again later.";

pub const DELETE_PROMPT: &str = "🗑️ Choose a city to remove from your list:";
pub const DELETE_LIST_UPDATED: &str = "🗑️ List updated. Choose the next city to remove:";
pub const NOTHING_TO_DELETE: &str = "🗑️ You have no saved cities to remove.";
pub const ALL_CITIES_DELETED: &str = "✨ All saved cities were removed.";
pub const NO_CITIES_LEFT: &str = "🗑️ No cities left to remove.";

pub const UNKNOWN_COLOR: &str = "⚠️ Unknown color.";

pub fn unknown_city(city: &str) -> String {
    format!("🤷 City '{city}' is not in my database. Make sure it is spelled in English!")
}

pub fn show_city_status(city: &str) -> String {
    format!("🗺️ Drawing a map for {city}... This may take a few seconds.")
}

pub fn show_city_caption(city: &str) -> String {
    format!("✅ Map for {city}")
}

pub fn show_city_failed(city: &str) -> String {
    format!("❌ Could not draw a map for '{city}'. It may have no coordinate data.")
}

pub fn city_saved(city: &str) -> String {
    format!("✅ {city} saved!")
}

pub fn city_already_saved(city: &str) -> String {
    format!("ℹ️ {city} was already saved.")
}

pub fn city_deleted(city: &str) -> String {
    format!("✅ {city} removed.")
}

pub fn city_not_deleted(city: &str) -> String {
    format!("❌ Could not remove {city}. It may have been removed already.")
}

pub fn color_prompt(current: MarkerColor) -> String {
    format!("🎨 Choose the marker color for your maps. Current color: {}.", current.label())
}

pub fn color_set_notice(color: MarkerColor) -> String {
    format!("✅ Marker color set to {}.", color.label())
}

pub fn color_set_message(color: MarkerColor) -> String {
    format!("🎨 Marker color is now {}.", color.label())
}
