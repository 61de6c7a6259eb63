use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::Contact;
use crate::repositories::acquire;
use crate::schema::contacts;

#[derive(Clone)]
pub struct ContactRepository {
    pool: AsyncDbPool,
}

impl ContactRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Contact> {
        let mut conn = acquire(&self.pool).await?;

        contacts::table
            .find(id)
            .select(Contact::as_select())
            .first(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::NotFound => AppError::NotFound {
                    entity: "Contact".to_string(),
                    field: "id".to_string(),
                    value: id.to_string(),
                },
                _ => AppError::from(e),
            })
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<Vec<Contact>> {
        let mut conn = acquire(&self.pool).await?;

        contacts::table
            .filter(contacts::id.eq_any(ids.to_vec()))
            .select(Contact::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Contact ids matching an ad hoc narrowing filter (explicit contact
    /// ids and/or account membership). Used to intersect a caller-supplied
    /// filter with a campaign audience.
    pub async fn ids_matching(
        &self,
        contact_ids: Option<&[Uuid]>,
        account_ids: Option<&[Uuid]>,
    ) -> AppResult<Vec<Uuid>> {
        let mut conn = acquire(&self.pool).await?;

        let mut query = contacts::table.select(contacts::id).into_boxed();
        if let Some(ids) = contact_ids {
            query = query.filter(contacts::id.eq_any(ids.to_vec()));
        }
        if let Some(ids) = account_ids {
            query = query.filter(contacts::account_id.eq_any(ids.to_vec()));
        }

        query.load(&mut conn).await.map_err(AppError::from)
    }
}
