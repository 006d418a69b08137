use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    contacts::{
        dto::{ContactQuery, Owner},
        repo_types::ContactRow,
    },
    db::{map_write_error, PgStore},
    error::Result,
    store::ContactStore,
};

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ContactQuery) {
    qb.push(" WHERE TRUE");
    match query.owner {
        Owner::Any => {}
        Owner::Anonymous => {
            qb.push(" AND user_id IS NULL");
        }
        Owner::User(id) => {
            qb.push(" AND user_id = ").push_bind(id);
        }
    }
    if let Some(is_read) = query.is_read {
        qb.push(" AND is_read = ").push_bind(is_read);
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn insert_contact(&self, row: &ContactRow) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contacts
                (id, name, email, message, user_id, is_read, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.message)
        .bind(row.user_id) // Option<Uuid> → NULL allowed
        .bind(row.is_read)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }

    async fn replace_contact(&self, row: &ContactRow) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contacts
               SET name = $2, email = $3, message = $4, user_id = $5, is_read = $6,
                   created_at = $7, updated_at = $8
             WHERE id = $1
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.message)
        .bind(row.user_id)
        .bind(row.is_read)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_contact(&self, id: Uuid) -> Result<Option<ContactRow>> {
        let row = sqlx::query_as::<_, ContactRow>(
            r#"
            SELECT id, name, email, message, user_id, is_read, created_at, updated_at
              FROM contacts
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_contacts(&self, query: &ContactQuery) -> Result<Vec<ContactRow>> {
        let mut qb = QueryBuilder::<Postgres>::new(concat!(
            "SELECT id, name, email, message, user_id, is_read, created_at, updated_at",
            " FROM contacts",
        ));
        push_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = qb
            .build_query_as::<ContactRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_contacts(&self, query: &ContactQuery) -> Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contacts");
        push_filters(&mut qb, query);
        let n = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_for(query: &ContactQuery) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM contacts");
        push_filters(&mut qb, query);
        qb.sql().to_string()
    }

    #[test]
    fn filters_render_expected_sql() {
        assert_eq!(sql_for(&ContactQuery::new()), "SELECT * FROM contacts WHERE TRUE");
        assert_eq!(
            sql_for(&ContactQuery::new().anonymous()),
            "SELECT * FROM contacts WHERE TRUE AND user_id IS NULL"
        );
        assert_eq!(
            sql_for(&ContactQuery::new().for_user(Uuid::new_v4()).unread()),
            "SELECT * FROM contacts WHERE TRUE AND user_id = $1 AND is_read = $2"
        );
    }
}
