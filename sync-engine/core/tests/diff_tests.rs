use expect_test::expect;
use sql_schema_describer::{
    Column, ColumnArity, ColumnType, DefaultValue, ForeignKey, ForeignKeyAction, Index, IndexColumn, IndexType,
    PrimaryKey, Procedure, SqlSchema, Table, Trigger, View,
};
use sync_core::{calculate_steps, render_steps, DiffOptions, Pair};

fn column(name: &str, full_data_type: &str) -> Column {
    let data_type = full_data_type
        .split(|c: char| c == '(' || c == ' ')
        .next()
        .unwrap()
        .to_owned();

    Column {
        name: name.to_owned(),
        tpe: ColumnType {
            data_type,
            full_data_type: full_data_type.to_owned(),
            arity: ColumnArity::Required,
        },
        default: None,
        auto_increment: false,
        comment: None,
    }
}

fn nullable(mut column: Column) -> Column {
    column.tpe.arity = ColumnArity::Nullable;
    column
}

fn with_default(mut column: Column, default: DefaultValue) -> Column {
    column.default = Some(default);
    column
}

fn index(name: &str, columns: &[&str], tpe: IndexType) -> Index {
    Index {
        name: name.to_owned(),
        columns: columns
            .iter()
            .map(|name| IndexColumn {
                name: (*name).to_owned(),
                length: None,
            })
            .collect(),
        tpe,
    }
}

fn foreign_key(constraint_name: &str, columns: &[&str], referenced_table: &str, referenced_columns: &[&str]) -> ForeignKey {
    ForeignKey {
        constraint_name: Some(constraint_name.to_owned()),
        columns: columns.iter().map(|s| (*s).to_owned()).collect(),
        referenced_table: referenced_table.to_owned(),
        referenced_columns: referenced_columns.iter().map(|s| (*s).to_owned()).collect(),
        on_delete_action: ForeignKeyAction::NoAction,
        on_update_action: ForeignKeyAction::NoAction,
    }
}

fn table(name: &str, columns: Vec<Column>) -> Table {
    Table {
        name: name.to_owned(),
        engine: Some("InnoDB".to_owned()),
        charset: Some("utf8mb4".to_owned()),
        collation: Some("utf8mb4_general_ci".to_owned()),
        columns,
        ..Default::default()
    }
}

fn schema(tables: Vec<Table>) -> SqlSchema {
    SqlSchema {
        tables,
        ..Default::default()
    }
}

fn diff(previous: &SqlSchema, next: &SqlSchema, opts: DiffOptions) -> String {
    let schemas = Pair::new(previous, next);
    let steps = calculate_steps(schemas, opts);

    render_steps(&steps, schemas, opts).join(";\n")
}

fn user_table() -> Table {
    let mut id = column("id", "int(11)");
    id.auto_increment = true;

    let mut user = table("User", vec![id, nullable(column("name", "varchar(191)"))]);
    user.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    user.indices = vec![index("User_name_key", &["name"], IndexType::Unique)];
    user
}

#[test]
fn identical_schemas_produce_no_steps() {
    let previous = schema(vec![user_table()]);
    let next = schema(vec![user_table()]);

    assert!(calculate_steps(Pair::new(&previous, &next), DiffOptions::default()).is_empty());
}

#[test]
fn a_created_table_renders_columns_indexes_and_options() {
    let previous = schema(vec![]);
    let next = schema(vec![user_table()]);

    let expectation = expect![[r#"
        CREATE TABLE `User` (
            `id` int(11) NOT NULL AUTO_INCREMENT,
            `name` varchar(191),
            UNIQUE INDEX `User_name_key`(`name`),
            PRIMARY KEY (`id`)
        ) ENGINE=InnoDB DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_general_ci"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn swapping_the_schema_pair_yields_the_revert() {
    let previous = schema(vec![]);
    let next = schema(vec![user_table()]);

    let expectation = expect!["DROP TABLE `User`"];
    expectation.assert_eq(&diff(&next, &previous, DiffOptions::default()));
}

#[test]
fn steps_come_out_in_execution_order() {
    let order_columns = || {
        vec![
            column("id", "int(11)"),
            column("user_id", "int(11)"),
            column("created_at", "datetime"),
        ]
    };

    let mut previous_order = table("Order", order_columns());
    previous_order.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    previous_order.indices = vec![
        index("Order_user_fkey", &["user_id"], IndexType::Normal),
        index("Order_created_at_idx", &["created_at"], IndexType::Normal),
    ];
    previous_order.foreign_keys = vec![foreign_key("Order_user_fkey", &["user_id"], "User", &["id"])];

    let mut legacy = table("Legacy", vec![column("id", "int(11)"), column("user_id", "int(11)")]);
    legacy.foreign_keys = vec![foreign_key("Legacy_user_fkey", &["user_id"], "User", &["id"])];

    let previous = schema(vec![user_table(), previous_order, legacy]);

    let mut next_order_columns = order_columns();
    next_order_columns.push(column("status", "varchar(16)"));
    let mut next_order = table("Order", next_order_columns);
    next_order.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });

    let mut invoice = table("Invoice", vec![column("id", "int(11)"), column("user_id", "int(11)")]);
    invoice.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    let mut invoice_fk = foreign_key("Invoice_user_fkey", &["user_id"], "User", &["id"]);
    invoice_fk.on_delete_action = ForeignKeyAction::Cascade;
    invoice.foreign_keys = vec![invoice_fk];

    let next = schema(vec![user_table(), next_order, invoice]);

    // The index backing `Order_user_fkey` goes away with the foreign key, so
    // no DROP INDEX is rendered for it.
    let expectation = expect![[r#"
        ALTER TABLE `Legacy` DROP FOREIGN KEY `Legacy_user_fkey`;
        ALTER TABLE `Order` DROP FOREIGN KEY `Order_user_fkey`;
        DROP INDEX `Order_created_at_idx` ON `Order`;
        ALTER TABLE `Order` ADD COLUMN `status` varchar(16) NOT NULL;
        DROP TABLE `Legacy`;
        CREATE TABLE `Invoice` (
            `id` int(11) NOT NULL,
            `user_id` int(11) NOT NULL,
            PRIMARY KEY (`id`)
        ) ENGINE=InnoDB DEFAULT CHARACTER SET utf8mb4 COLLATE utf8mb4_general_ci;
        ALTER TABLE `Invoice` ADD CONSTRAINT `Invoice_user_fkey` FOREIGN KEY (`user_id`) REFERENCES `User`(`id`) ON DELETE CASCADE"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn changed_columns_render_as_modify() {
    let previous = schema(vec![table(
        "Account",
        vec![
            column("balance", "decimal(10,2)"),
            with_default(nullable(column("nickname", "varchar(50)")), DefaultValue::Value("anon".to_owned())),
        ],
    )]);
    let next = schema(vec![table(
        "Account",
        vec![column("balance", "decimal(12,4)"), nullable(column("nickname", "varchar(50)"))],
    )]);

    let expectation = expect![[r#"
        ALTER TABLE `Account` MODIFY `balance` decimal(12,4) NOT NULL,
            ALTER COLUMN `nickname` DROP DEFAULT"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn defaults_render_with_quoting_and_timestamp_precision() {
    let previous = schema(vec![table(
        "Event",
        vec![column("created_at", "datetime(3)"), column("status", "varchar(16)")],
    )]);
    let next = schema(vec![table(
        "Event",
        vec![
            with_default(column("created_at", "datetime(3)"), DefaultValue::Now),
            with_default(column("status", "varchar(16)"), DefaultValue::Value("it's fine".to_owned())),
        ],
    )]);

    let expectation = expect![[r#"
        ALTER TABLE `Event` MODIFY `created_at` datetime(3) NOT NULL DEFAULT CURRENT_TIMESTAMP(3),
            MODIFY `status` varchar(16) NOT NULL DEFAULT 'it''s fine'"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn comments_only_count_when_comment_sync_is_on() {
    let previous = schema(vec![table("Tag", vec![column("name", "varchar(32)")])]);

    let mut next_column = column("name", "varchar(32)");
    next_column.comment = Some("label".to_owned());
    let mut next_tag = table("Tag", vec![next_column]);
    next_tag.comment = Some("tags".to_owned());
    let next = schema(vec![next_tag]);

    assert!(calculate_steps(Pair::new(&previous, &next), DiffOptions::default()).is_empty());

    let opts = DiffOptions {
        sync_comments: true,
        ..Default::default()
    };
    let expectation = expect![[r#"
        ALTER TABLE `Tag` MODIFY `name` varchar(32) NOT NULL COMMENT 'label',
            COMMENT='tags'"#]];
    expectation.assert_eq(&diff(&previous, &next, opts));
}

#[test]
fn auto_increment_only_counts_when_auto_increment_sync_is_on() {
    let mut previous_log = table("Log", vec![column("id", "int(11)")]);
    previous_log.auto_increment = Some(5);
    let previous = schema(vec![previous_log]);

    let mut next_log = table("Log", vec![column("id", "int(11)")]);
    next_log.auto_increment = Some(100);
    let next = schema(vec![next_log]);

    assert!(calculate_steps(Pair::new(&previous, &next), DiffOptions::default()).is_empty());

    let opts = DiffOptions {
        sync_auto_increment: true,
        ..Default::default()
    };
    let expectation = expect!["ALTER TABLE `Log` AUTO_INCREMENT=100"];
    expectation.assert_eq(&diff(&previous, &next, opts));
}

#[test]
fn a_changed_primary_key_is_dropped_and_recreated() {
    let session_columns = || vec![column("id", "int(11)"), column("token", "varchar(64)")];

    let mut previous_session = table("Session", session_columns());
    previous_session.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    let previous = schema(vec![previous_session]);

    let mut next_session = table("Session", session_columns());
    next_session.primary_key = Some(PrimaryKey {
        columns: vec!["token".to_owned()],
    });
    let next = schema(vec![next_session]);

    let expectation = expect![[r#"
        ALTER TABLE `Session` DROP PRIMARY KEY,
            ADD PRIMARY KEY (`token`)"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn a_primary_key_is_recreated_around_a_column_type_change() {
    let mut previous_session = table("Session", vec![column("id", "int(11)")]);
    previous_session.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    let previous = schema(vec![previous_session]);

    let mut next_session = table("Session", vec![column("id", "bigint(20)")]);
    next_session.primary_key = Some(PrimaryKey {
        columns: vec!["id".to_owned()],
    });
    let next = schema(vec![next_session]);

    let expectation = expect![[r#"
        ALTER TABLE `Session` DROP PRIMARY KEY,
            MODIFY `id` bigint(20) NOT NULL,
            ADD PRIMARY KEY (`id`)"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn a_changed_index_is_dropped_and_recreated() {
    let mut previous_article = table("Article", vec![column("title", "varchar(255)")]);
    previous_article.indices = vec![index("Article_title_idx", &["title"], IndexType::Normal)];
    let previous = schema(vec![previous_article]);

    let mut next_article = table("Article", vec![column("title", "varchar(255)")]);
    next_article.indices = vec![Index {
        name: "Article_title_idx".to_owned(),
        columns: vec![IndexColumn {
            name: "title".to_owned(),
            length: Some(10),
        }],
        tpe: IndexType::Normal,
    }];
    let next = schema(vec![next_article]);

    let expectation = expect![[r#"
        DROP INDEX `Article_title_idx` ON `Article`;
        CREATE INDEX `Article_title_idx` ON `Article`(`title`(10))"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn long_index_names_are_truncated() {
    let previous = schema(vec![table("Article", vec![column("title", "varchar(255)")])]);

    let mut next_article = table("Article", vec![column("title", "varchar(255)")]);
    next_article.indices = vec![index(&"a".repeat(70), &["title"], IndexType::Normal)];
    let next = schema(vec![next_article]);

    assert_eq!(
        diff(&previous, &next, DiffOptions::default()),
        format!("CREATE INDEX `{}` ON `Article`(`title`)", "a".repeat(64)),
    );
}

#[test]
fn views_triggers_and_procedures_are_synced() {
    let previous = SqlSchema {
        tables: vec![user_table()],
        views: vec![
            View {
                name: "v_active".to_owned(),
                definition: Some("select `id` from `User`".to_owned()),
            },
            View {
                name: "v_dead".to_owned(),
                definition: Some("select 1".to_owned()),
            },
        ],
        triggers: vec![Trigger {
            name: "trg_audit".to_owned(),
            timing: "BEFORE".to_owned(),
            event: "INSERT".to_owned(),
            table: "User".to_owned(),
            statement: "SET NEW.`created_at` = CURRENT_TIMESTAMP".to_owned(),
        }],
        procedures: vec![Procedure {
            name: "proc_cleanup".to_owned(),
            definition: Some("CREATE PROCEDURE `proc_cleanup`() DELETE FROM `Session`".to_owned()),
        }],
    };

    let next = SqlSchema {
        tables: vec![user_table()],
        views: vec![View {
            name: "v_active".to_owned(),
            definition: Some("select `id`,`name` from `User`".to_owned()),
        }],
        triggers: vec![Trigger {
            name: "trg_audit".to_owned(),
            timing: "BEFORE".to_owned(),
            event: "INSERT".to_owned(),
            table: "User".to_owned(),
            statement: "SET NEW.`created_at` = CURRENT_TIMESTAMP(3)".to_owned(),
        }],
        procedures: vec![Procedure {
            name: "proc_cleanup".to_owned(),
            definition: Some("CREATE PROCEDURE `proc_cleanup`() DELETE FROM `Session` WHERE `expired` = 1".to_owned()),
        }],
    };

    let expectation = expect![[r#"
        DROP VIEW `v_dead`;
        DROP TRIGGER `trg_audit`;
        DROP PROCEDURE `proc_cleanup`;
        CREATE OR REPLACE VIEW `v_active` AS select `id`,`name` from `User`;
        CREATE TRIGGER `trg_audit` BEFORE INSERT ON `User` FOR EACH ROW SET NEW.`created_at` = CURRENT_TIMESTAMP(3);
        CREATE PROCEDURE `proc_cleanup`() DELETE FROM `Session` WHERE `expired` = 1"#]];
    expectation.assert_eq(&diff(&previous, &next, DiffOptions::default()));
}

#[test]
fn procedures_without_a_readable_definition_are_left_alone() {
    let previous = SqlSchema {
        procedures: vec![Procedure {
            name: "proc_secret".to_owned(),
            definition: Some("CREATE PROCEDURE `proc_secret`() SELECT 1".to_owned()),
        }],
        ..Default::default()
    };
    let next = SqlSchema {
        procedures: vec![
            Procedure {
                name: "proc_secret".to_owned(),
                definition: None,
            },
            Procedure {
                name: "proc_new".to_owned(),
                definition: None,
            },
        ],
        ..Default::default()
    };

    assert!(calculate_steps(Pair::new(&previous, &next), DiffOptions::default()).is_empty());
}
