use log::{debug, info};

use crate::error::{Error, Result};
use crate::index::{DISTANCE, Distance, EMBEDDING_DIM, IndexError, VectorIndexService};
use crate::types::CollectionStatus;

/// Creates collections with the deployment-wide schema, tolerating existing ones
pub struct CollectionLifecycleManager<'a, V> {
    index: &'a V,
    dimension: usize,
    distance: Distance,
}

impl<'a, V: VectorIndexService> CollectionLifecycleManager<'a, V> {
    pub fn new(index: &'a V) -> Self {
        Self { index, dimension: EMBEDDING_DIM, distance: DISTANCE }
    }

    pub async fn ensure_collection(&self, collection: &str) -> Result<CollectionStatus> {
        match self.index.create_collection(collection, self.dimension, self.distance).await {
            Ok(()) => {
                info!("created collection {collection}");
                Ok(CollectionStatus::Created)
            }
            Err(IndexError::AlreadyExists(_)) => {
                debug!("collection {collection} already exists");
                Ok(CollectionStatus::AlreadyExists)
            }
            Err(source) => {
                Err(Error::CollectionSetup { collection: collection.to_string(), source })
            }
        }
    }
}
