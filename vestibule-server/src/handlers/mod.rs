pub mod queue;
pub mod waiting_room;

pub(crate) fn default_queue() -> String {
    "default".to_string()
}
