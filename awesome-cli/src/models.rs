//! Tables of the awesome blog application.

use awesome_orm::{model, next_id, now_timestamp, Field, Model, TableSchema};

model! {
    /// Site account. `admin` marks administrators.
    pub struct User => "users" {
        id: String = Field::string().primary_key().default_with(next_id).ddl("varchar(50)"),
        email: String = Field::string().ddl("varchar(50)"),
        passwd: String = Field::string().ddl("varchar(50)"),
        admin: bool = Field::boolean(),
        name: String = Field::string().ddl("varchar(50)"),
        image: String = Field::string().ddl("varchar(500)"),
        // stored as epoch seconds to avoid time zone conversion
        created_at: f64 = Field::float().default_with(now_timestamp),
    }
}

model! {
    pub struct Blog => "blogs" {
        id: String = Field::string().primary_key().default_with(next_id).ddl("varchar(50)"),
        user_id: String = Field::string().ddl("varchar(50)"),
        user_name: String = Field::string().ddl("varchar(50)"),
        user_image: String = Field::string().ddl("varchar(500)"),
        name: String = Field::string().ddl("varchar(50)"),
        summary: String = Field::string().ddl("varchar(200)"),
        content: String = Field::text(),
        created_at: f64 = Field::float().default_with(now_timestamp),
    }
}

model! {
    pub struct Comment => "comments" {
        id: String = Field::string().primary_key().default_with(next_id).ddl("varchar(50)"),
        blog_id: String = Field::string().ddl("varchar(50)"),
        user_id: String = Field::string().ddl("varchar(50)"),
        user_name: String = Field::string().ddl("varchar(50)"),
        user_image: String = Field::string().ddl("varchar(500)"),
        content: String = Field::text(),
        created_at: f64 = Field::float().default_with(now_timestamp),
    }
}

/// Register every table; a bad declaration panics here, at startup
pub fn register_all() -> [&'static TableSchema; 3] {
    [User::register(), Blog::register(), Comment::register()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_register() {
        let tables: Vec<_> = register_all().iter().map(|s| s.table()).collect();
        assert_eq!(tables, ["users", "blogs", "comments"]);
    }

    #[test]
    fn test_user_insert_template() {
        assert_eq!(
            User::schema().insert_sql(),
            "insert into `users` (`email`, `passwd`, `admin`, `name`, `image`, `created_at`, `id`) \
             values (?, ?, ?, ?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_blog_content_is_text() {
        let field = Blog::schema().field("content").unwrap();
        assert_eq!(field.column_type(), "text");
        assert!(field.default().is_none());
    }
}
