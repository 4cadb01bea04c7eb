//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryKind, CategoryName},
};

/// Create a category and return it with its generated ID.
pub fn create_category(
    name: CategoryName,
    kind: CategoryKind,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, kind) VALUES (?1, ?2);",
        (name.as_ref(), kind.as_str()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        kind: Some(kind),
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories in insertion order.
///
/// Insertion order drives the row order of the per-category breakdown.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, kind FROM category ORDER BY id ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Initialize the category table.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT
        );",
        (),
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let raw_kind: Option<String> = row.get(2)?;

    let name = CategoryName::new_unchecked(&raw_name);
    // NULL and unrecognized kinds both normalize to None at read time.
    let kind = raw_kind.as_deref().and_then(CategoryKind::parse);

    Ok(Category { id, name, kind })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        category::{
            Category, CategoryKind, CategoryName, create_category, get_all_categories,
            get_category,
        },
    };

    use super::create_category_table;

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Maaş").unwrap();

        let category = create_category(name.clone(), CategoryKind::Income, &connection);

        let got_category = category.expect("Could not create category");
        assert!(got_category.id > 0);
        assert_eq!(got_category.name, name);
        assert_eq!(got_category.kind, Some(CategoryKind::Income));
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let connection = get_test_db_connection();
        let name = CategoryName::new_unchecked("Kira");
        create_category(name.clone(), CategoryKind::Expense, &connection)
            .expect("Could not create test category");

        let duplicate = create_category(name, CategoryKind::Expense, &connection);

        assert_eq!(duplicate, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn get_category_succeeds() {
        let connection = get_test_db_connection();
        let inserted_category = create_category(
            CategoryName::new_unchecked("Foo"),
            CategoryKind::Income,
            &connection,
        )
        .expect("Could not create test category");

        let selected_category = get_category(inserted_category.id, &connection);

        assert_eq!(Ok(inserted_category), selected_category);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let connection = get_test_db_connection();
        let inserted_category = create_category(
            CategoryName::new_unchecked("Foo"),
            CategoryKind::Income,
            &connection,
        )
        .expect("Could not create test category");

        let selected_category = get_category(inserted_category.id + 123, &connection);

        assert_eq!(selected_category, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_preserves_insertion_order() {
        let connection = get_test_db_connection();
        let inserted_categories = vec![
            create_category(
                CategoryName::new_unchecked("Zebra"),
                CategoryKind::Expense,
                &connection,
            )
            .expect("Could not create test category"),
            create_category(
                CategoryName::new_unchecked("Aslan"),
                CategoryKind::Income,
                &connection,
            )
            .expect("Could not create test category"),
        ];

        let selected_categories =
            get_all_categories(&connection).expect("Could not get all categories");

        assert_eq!(inserted_categories, selected_categories);
    }

    #[test]
    fn null_kind_reads_as_none() {
        let connection = get_test_db_connection();
        connection
            .execute("INSERT INTO category (name) VALUES ('eski');", ())
            .expect("Could not insert legacy row");

        let categories = get_all_categories(&connection).expect("Could not get all categories");

        assert_eq!(
            categories,
            vec![Category {
                id: 1,
                name: CategoryName::new_unchecked("eski"),
                kind: None,
            }]
        );
    }

    #[test]
    fn unknown_kind_reads_as_none() {
        let connection = get_test_db_connection();
        connection
            .execute(
                "INSERT INTO category (name, kind) VALUES ('eski', 'giderler');",
                (),
            )
            .expect("Could not insert legacy row");

        let category = get_category(1, &connection).expect("Could not get category");

        assert_eq!(category.kind, None);
    }
}
