//! Static target schemas for the seven output tables.
//!
//! Each logical field carries the set of acceptable header spellings
//! (matched case-insensitively, see [`crate::resolve`]) and a fallback rule
//! applied when no source column binds to it. Alias sets follow the column
//! candidates accepted by the legacy builder this tool replaces.

/// Default applied to a logical field with no matched source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Fixed literal value.
    Literal(&'static str),
    /// 1-based row index, used as a synthetic identifier.
    RowIndex,
}

/// One logical field of a target schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Acceptable header spellings, lowercase.
    pub aliases: &'static [&'static str],
    pub fallback: Fallback,
}

const fn field(name: &'static str, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        aliases,
        fallback: Fallback::Literal(""),
    }
}

/// Ordered field list for one output table. Field order is also resolver
/// priority order: earlier fields claim matching headers first.
#[derive(Debug, Clone, Copy)]
pub struct SchemaSpec {
    pub fields: &'static [FieldSpec],
}

impl SchemaSpec {
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.to_string()).collect()
    }
}

/// The seven output tables, in archive order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Rooms,
    Teachers,
    Students,
    ClassMemberships,
    Subjects,
    Courses,
    ClassesAndLessons,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Rooms,
        Category::Teachers,
        Category::Students,
        Category::ClassMemberships,
        Category::Subjects,
        Category::Courses,
        Category::ClassesAndLessons,
    ];

    /// Archive member name for this table.
    pub fn file_name(&self) -> &'static str {
        match self {
            Category::Rooms => "ROOM.csv",
            Category::Teachers => "Teacher.csv",
            Category::Students => "Student.csv",
            Category::ClassMemberships => "ClassMemberships.csv",
            Category::Subjects => "SUBJECT.csv",
            Category::Courses => "COURSES.csv",
            Category::ClassesAndLessons => "ClassesAndLessons.csv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Rooms => "rooms",
            Category::Teachers => "teachers",
            Category::Students => "students",
            Category::ClassMemberships => "class memberships",
            Category::Subjects => "subjects",
            Category::Courses => "courses",
            Category::ClassesAndLessons => "classes & lessons",
        }
    }

    pub fn spec(&self) -> SchemaSpec {
        let fields: &'static [FieldSpec] = match self {
            Category::Rooms => ROOM_FIELDS,
            Category::Teachers => TEACHER_FIELDS,
            Category::Students => STUDENT_FIELDS,
            Category::ClassMemberships => MEMBERSHIP_FIELDS,
            Category::Subjects => SUBJECT_FIELDS,
            Category::Courses => COURSE_FIELDS,
            Category::ClassesAndLessons => CLASS_FIELDS,
        };
        SchemaSpec { fields }
    }
}

const ROOM_FIELDS: &[FieldSpec] = &[
    field("RoomCode", &["code", "room code", "roomcode"]),
    field("RoomName", &["notes", "room name", "roomname"]),
    FieldSpec {
        name: "Capacity",
        aliases: &["size", "capacity", "cap"],
        fallback: Fallback::Literal("0"),
    },
];

// FirstName/LastName bind real given/family-name columns when present; a
// bare "Name" column still scores as a substring of the aliases and is
// split by the builder (see builders::apply_name_split).
const TEACHER_FIELDS: &[FieldSpec] = &[
    field("TeacherCode", &["code", "teacher code", "teachercode"]),
    field("FirstName", &["first name", "firstname", "given name"]),
    field(
        "LastName",
        &["last name", "lastname", "surname", "family name"],
    ),
    field("FacultyCode", &["faculty", "faculty code", "facultycode"]),
    field("HomeSpace", &["home space", "homespace"]),
    field(
        "LearningSupport",
        &["learning support", "learningsupport"],
    ),
];

// YearLevelCode/YearLevel/Curriculum are filled from the upload's file name
// (year-level exports), never from a column; Gender has no source either.
const STUDENT_FIELDS: &[FieldSpec] = &[
    field("StudentCode", &["code", "student code", "studentcode"]),
    field("FirstName", &["first name", "firstname", "given name"]),
    field(
        "LastName",
        &["last name", "lastname", "surname", "family name"],
    ),
    field(
        "CoreStudentBodyCode",
        &["letter", "core student body code", "corestudentbodycode"],
    ),
    field("YearLevelCode", &[]),
    field("YearLevel", &[]),
    field("Curriculum", &[]),
    field("Gender", &[]),
    field("Email", &["email", "e-mail", "email address"]),
];

/// Derived table: melted from student uploads, no direct column resolution.
const MEMBERSHIP_FIELDS: &[FieldSpec] = &[field("StudentCode", &[]), field("ClassCode", &[])];

const SUBJECT_FIELDS: &[FieldSpec] = &[
    field("SubjectCode", &["code", "subject code", "subjectcode"]),
    field(
        "SubjectName",
        &["name", "subject", "subject name", "subjectname"],
    ),
    field("FacultyCode", &["faculty", "faculty code", "facultycode"]),
];

// CurriculumName comes from the upload's file name; Type and RotationSet
// are normalized by the builder after the raw cells are copied.
const COURSE_FIELDS: &[FieldSpec] = &[
    field("CourseCode", &["course", "course code", "coursecode"]),
    field("CourseName", &["subject", "course name", "coursename"]),
    field("CurriculumName", &[]),
    field(
        "SubjectCode",
        &["faculty", "subject code", "subjectcode"],
    ),
    field("Type", &["line", "type"]),
    field(
        "RotationSet",
        &["rot", "rotation", "rotation set", "rotationset"],
    ),
];

// PeriodCode, CourseCode, and ClassIdentifier are computed by the builder
// from the day/period and class columns.
const CLASS_FIELDS: &[FieldSpec] = &[
    field("PeriodCode", &[]),
    field("CourseCode", &[]),
    field("ClassIdentifier", &[]),
    field(
        "TeacherCode",
        &[
            "teacher code",
            "teachercode",
            "teacher",
            "staff code",
            "staffcode",
            "staff",
        ],
    ),
    field("RoomCode", &["room code", "roomcode", "room", "rm"]),
    field(
        "Rotation",
        &["rotation", "rot", "rotation set", "rotationset"],
    ),
];

/// Auxiliary alias sets for columns consumed by builder passes rather than
/// copied into the output directly.
pub mod aux {
    pub const DAY: &[&str] = &["day", "day name", "dayname"];
    pub const PERIOD: &[&str] = &["period", "per"];
    pub const CLASS: &[&str] = &[
        "class",
        "class code",
        "classcode",
        "class identifier",
        "classidentifier",
    ];
    pub const MEMBER_CODE: &[&str] = &["code", "student code", "studentcode"];
}
