// Record trait shared by every storable collection type

use serde::{Serialize, de::DeserializeOwned};

/// Core trait that any storable record must implement
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Unique identifier for this record (also the key in the collection file)
    fn id(&self) -> &str;

    /// Assign the identifier. Only the store calls this, once, on create.
    fn set_id(&mut self, id: String);

    /// Collection name for this record type (e.g., "contacts", "tasks")
    /// Determines the filename: {collection}.json
    fn collection_name() -> &'static str
    where
        Self: Sized;

    /// Short prefix put in front of generated ids ("cont", "tk")
    fn id_prefix() -> &'static str
    where
        Self: Sized;

    /// Every JSON key that carries the id on input (wire name and aliases)
    fn id_keys() -> &'static [&'static str]
    where
        Self: Sized;

    /// Human readable name used in confirmation messages
    fn label() -> &'static str
    where
        Self: Sized;
}
