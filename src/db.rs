use anyhow::Context;
use chrono::{Datelike, Days, NaiveDate};
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AttendanceRecord, AttendanceStatus, StudentEnrollment};
use crate::source;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("failed to run migrations")?;
    Ok(())
}

async fn upsert_student(
    conn: &mut PgConnection,
    full_name: &str,
    email: &str,
) -> anyhow::Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO attendance_calendar.students (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .fetch_one(&mut *conn)
    .await?
    .get("id");
    Ok(id)
}

async fn upsert_enrollment(
    conn: &mut PgConnection,
    student_id: Uuid,
    course: &str,
    start_date: NaiveDate,
    duration_text: Option<&str>,
) -> anyhow::Result<Uuid> {
    let id = sqlx::query(
        r#"
        INSERT INTO attendance_calendar.enrollments
        (id, student_id, course, start_date, duration_text)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (student_id, course) DO UPDATE
        SET start_date = EXCLUDED.start_date, duration_text = EXCLUDED.duration_text
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(course)
    .bind(start_date)
    .bind(duration_text)
    .fetch_one(&mut *conn)
    .await?
    .get("id");
    Ok(id)
}

/// Returns true when the row was inserted or its status changed.
async fn upsert_attendance(
    conn: &mut PgConnection,
    enrollment_id: Uuid,
    record: &AttendanceRecord,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_calendar.attendance (id, enrollment_id, attended_on, status)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (enrollment_id, attended_on) DO UPDATE
        SET status = EXCLUDED.status
        WHERE attendance.status IS DISTINCT FROM EXCLUDED.status
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(enrollment_id)
    .bind(record.date)
    .bind(record.status.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let start = NaiveDate::from_ymd_opt(2026, 1, 5).context("invalid date")?;
    let students = vec![
        ("Avery Lee", "avery.lee@educrm.test", "Full Stack Development", Some("8 weeks")),
        ("Jules Moreno", "jules.moreno@educrm.test", "Data Science", Some("3 Months")),
        ("Kiara Patel", "kiara.patel@educrm.test", "UI/UX Design", None),
    ];

    // Rotated by one day per student.
    let pattern = [
        AttendanceStatus::Present,
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Pending,
        AttendanceStatus::Present,
    ];

    let mut tx = pool.begin().await?;
    for (offset, (name, email, course, duration)) in students.into_iter().enumerate() {
        let student_id = upsert_student(&mut *tx, name, email).await?;
        let enrollment_id =
            upsert_enrollment(&mut *tx, student_id, course, start, duration).await?;

        for day in 0..21u64 {
            let date = start
                .checked_add_days(Days::new(day))
                .context("seed date out of range")?;
            // Skip weekends except for the first student.
            let weekday = date.weekday().num_days_from_sunday();
            if offset > 0 && (weekday == 0 || weekday == 6) {
                continue;
            }
            let status = pattern[(day as usize + offset) % pattern.len()];
            upsert_attendance(&mut *tx, enrollment_id, &AttendanceRecord { date, status })
                .await?;
        }
    }
    tx.commit().await?;

    info!("seeded demo enrollments");
    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let rows = source::read_import_csv(csv_path)?;
    let mut tx = pool.begin().await?;
    let mut changed = 0usize;

    for row in &rows {
        let student_id = upsert_student(&mut *tx, &row.full_name, &row.email).await?;
        let enrollment_id = upsert_enrollment(
            &mut *tx,
            student_id,
            &row.course,
            row.start_date,
            row.duration_text.as_deref(),
        )
        .await?;

        if upsert_attendance(&mut *tx, enrollment_id, &row.record).await? {
            changed += 1;
        }
    }

    tx.commit()
        .await
        .with_context(|| format!("failed to commit import of {}", csv_path.display()))?;
    debug!(rows = rows.len(), changed, "import committed");
    Ok(changed)
}

pub async fn fetch_enrollment(
    pool: &PgPool,
    email: &str,
    course: &str,
) -> anyhow::Result<Option<StudentEnrollment>> {
    let row = sqlx::query(
        "SELECT e.id AS enrollment_id, s.full_name, s.email, e.course, \
         e.start_date, e.duration_text \
         FROM attendance_calendar.enrollments e \
         JOIN attendance_calendar.students s ON s.id = e.student_id \
         WHERE s.email = $1 AND e.course = $2",
    )
    .bind(email.trim().to_lowercase())
    .bind(course)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| StudentEnrollment {
        enrollment_id: row.get("enrollment_id"),
        student_name: row.get("full_name"),
        student_email: row.get("email"),
        course: row.get("course"),
        start_date: row.get("start_date"),
        duration_text: row.get("duration_text"),
    }))
}

pub async fn fetch_attendance(
    pool: &PgPool,
    enrollment_id: Uuid,
) -> anyhow::Result<Vec<AttendanceRecord>> {
    let rows = sqlx::query(
        "SELECT attended_on, status \
         FROM attendance_calendar.attendance \
         WHERE enrollment_id = $1 \
         ORDER BY attended_on",
    )
    .bind(enrollment_id)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let status: String = row.get("status");
        records.push(AttendanceRecord {
            date: row.get("attended_on"),
            status: status.parse()?,
        });
    }

    Ok(records)
}
