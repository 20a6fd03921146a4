use crate::model::attendance::{Action, AttendanceEvent, TimelineRow};
use crate::model::correction::CorrectionRecord;
use crate::model::student::Student;
use crate::model::time_period::TimePeriod;
use crate::models::{
    Board, BoardEntry, CorrectionsResponse, CurrentView, RosterResponse, SubmitRequest,
    SubmitResult, TimelineResponse, TodaySummary,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nest Attendance API",
        version = "0.1.0",
        description = r#"
## Before/after-school attendance

Students are checked in and out by staff on a shared board. Every submission is appended
to a checkin or checkout log; nothing is ever updated in place.

### Key Features
- **Live presence**: who is checked in and not yet checked out, for the morning or afternoon session
- **Boards**: the roster marked with who is already recorded this session
- **Timeline**: merged check-in/check-out history over a date range
- **Corrections**: staff correction form responses, one row per student

### Sessions
Submissions before 09:00 local time belong to the morning session, the rest to the afternoon.
Within a session the first check-in of a student counts; in the timeline the last row per day wins.

### Errors
Errors are JSON: `{"error": {"code": "...", "message": "..."}}`.
"#,
    ),
    paths(
        crate::api::health,

        crate::api::attendance::today,
        crate::api::attendance::current,
        crate::api::attendance::timeline,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,

        crate::api::corrections::list_corrections,

        crate::api::roster::list_students,
        crate::api::roster::board
    ),
    components(
        schemas(
            Action,
            TimePeriod,
            AttendanceEvent,
            TimelineRow,
            CorrectionRecord,
            Student,
            SubmitRequest,
            SubmitResult,
            TodaySummary,
            CurrentView,
            Board,
            BoardEntry,
            TimelineResponse,
            CorrectionsResponse,
            RosterResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in, check-out and presence APIs"),
        (name = "Corrections", description = "Staff correction form APIs"),
        (name = "Roster", description = "Student roster and board APIs"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
