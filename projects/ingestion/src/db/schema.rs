diesel::table! {
    github_issues (id) {
        id -> Int4,
        title -> Text,
        issue_number -> Int4,
        created_at -> Nullable<Timestamptz>,
        closed_at -> Nullable<Timestamptz>,
        repo -> Text,
    }
}

diesel::table! {
    so_posts (id) {
        id -> Int4,
        title -> Text,
        body -> Text,
        created_at -> Nullable<Timestamptz>,
        closed_at -> Nullable<Timestamptz>,
        technology -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    github_issues,
    so_posts,
);
