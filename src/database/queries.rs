pub mod points {
    pub const COLUMNS: &str = r#"
        id
      , title
      , author
      , description
      , category
      , longitude
      , latitude
      , likes
      , created_at
    "#;

    pub const INSERT: &str = r#"
    INSERT INTO points (
        title
      , author
      , description
      , category
      , longitude
      , latitude
      , likes
      , created_at
    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    "#;

    pub const DELETE_ALL: &str = r#"
    DELETE FROM points
    "#;

    pub const WITHIN_SPHERE: &str = "central_angle(?, ?, longitude, latitude) <= ?";

    pub const WITHIN_BOX: &str = "longitude BETWEEN ? AND ? AND latitude BETWEEN ? AND ?";

    pub const CATEGORY_EQ: &str = "category = ?";

    pub const ORDER_POPULARITY: &str = "category DESC, likes DESC, created_at DESC, id DESC";

    pub const ORDER_RECENT: &str = "created_at DESC, id DESC";

    pub const ORDER_INSERTION: &str = "id ASC";
}
