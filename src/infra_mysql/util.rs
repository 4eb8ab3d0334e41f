use sqlx::mysql::MySqlDatabaseError;

const ER_DUP_ENTRY: u16 = 1062;
const ER_LOCK_DEADLOCK: u16 = 1213;

fn mysql_error_number(err: &sqlx::Error) -> Option<u16> {
    if let sqlx::Error::Database(db) = err {
        if let Some(mysql_err) = db.try_downcast_ref::<MySqlDatabaseError>() {
            return Some(mysql_err.number());
        }
    }

    None
}

pub fn is_dup_key(err: &sqlx::Error) -> bool {
    mysql_error_number(err) == Some(ER_DUP_ENTRY)
}

/// Two writers raced for the same absent row. Under REPEATABLE READ the gap
/// locks taken by `SELECT … FOR UPDATE` turn the second insert into a
/// deadlock rather than a duplicate key, so both count.
pub fn is_lost_race(err: &sqlx::Error) -> bool {
    matches!(
        mysql_error_number(err),
        Some(ER_DUP_ENTRY) | Some(ER_LOCK_DEADLOCK)
    )
}
