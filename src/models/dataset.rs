use super::{Preference, Project, ProjectId, Student, StudentId};
use std::collections::HashMap;
use tracing::instrument;

/// Integrity failures detected while building a [`Dataset`].
///
/// Any of these aborts the run before it begins; no partial state is kept.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("student roster is empty")]
    NoStudents,
    #[error("project catalog is empty")]
    NoProjects,
    #[error("duplicate student id: {0}")]
    DuplicateStudent(StudentId),
    #[error("duplicate project id: {0}")]
    DuplicateProject(ProjectId),
    #[error("student {student} has gpa {gpa} outside 0.00..=4.00")]
    GpaOutOfRange { student: StudentId, gpa: f64 },
    #[error("project {project} has invalid capacity band {min}..={max}")]
    InvalidCapacity {
        project: ProjectId,
        min: u32,
        max: u32,
    },
    #[error("project {project} has negative required gpa {required}")]
    NegativeRequiredGpa { project: ProjectId, required: f64 },
    #[error("preference references unknown student {0}")]
    UnknownPreferenceStudent(StudentId),
    #[error("preference of student {student} references unknown project {project}")]
    UnknownPreferenceProject {
        student: StudentId,
        project: ProjectId,
    },
    #[error("preference of student {student} for project {project} has rank {rank}, expected 1..=5")]
    RankOutOfRange {
        student: StudentId,
        project: ProjectId,
        rank: u8,
    },
    #[error("student {student} ranks project {project} more than once")]
    DuplicatePreference {
        student: StudentId,
        project: ProjectId,
    },
    #[error("student {student} uses rank {rank} more than once")]
    DuplicateRank { student: StudentId, rank: u8 },
    #[error("student {student} names unknown partner {partner}")]
    UnknownPartner {
        student: StudentId,
        partner: StudentId,
    },
    #[error("student {0} names themselves as partner")]
    SelfPartner(StudentId),
}

/// Immutable input snapshot for one run: students, projects, preferences,
/// and the lookup tables the engine needs.
///
/// Construction validates referential integrity and precomputes:
///
/// - the position ↔ [`StudentId`] bijection (positions follow roster order),
/// - the [`ProjectId`] → [`Project`] lookup,
/// - the per-student project → rank table,
/// - the partner position per roster position,
/// - the candidate project id list used for random construction.
///
/// The snapshot is read-only for the duration of a run, so it can be shared
/// freely across parallel fitness workers.
#[derive(Debug, Clone)]
pub struct Dataset {
    students: Vec<Student>,
    projects: Vec<Project>,
    preferences: Vec<Preference>,
    project_by_id: HashMap<ProjectId, usize>,
    position_by_id: HashMap<StudentId, usize>,
    ranks_by_student: HashMap<StudentId, HashMap<ProjectId, u8>>,
    partner_positions: Vec<Option<usize>>,
    candidate_projects: Vec<ProjectId>,
}

impl Dataset {
    #[instrument(level = "debug", skip_all, fields(students = students.len(), projects = projects.len(), preferences = preferences.len()))]
    pub fn new(
        students: Vec<Student>,
        projects: Vec<Project>,
        preferences: Vec<Preference>,
    ) -> Result<Self, DatasetError> {
        if students.is_empty() {
            return Err(DatasetError::NoStudents);
        }
        if projects.is_empty() {
            return Err(DatasetError::NoProjects);
        }

        let mut position_by_id = HashMap::with_capacity(students.len());
        for (position, student) in students.iter().enumerate() {
            if position_by_id.insert(student.id, position).is_some() {
                return Err(DatasetError::DuplicateStudent(student.id));
            }
            if !(0.0..=4.0).contains(&student.gpa) {
                return Err(DatasetError::GpaOutOfRange {
                    student: student.id,
                    gpa: student.gpa,
                });
            }
        }

        let mut project_by_id = HashMap::with_capacity(projects.len());
        for (index, project) in projects.iter().enumerate() {
            if project_by_id.insert(project.id, index).is_some() {
                return Err(DatasetError::DuplicateProject(project.id));
            }
            if project.min_capacity < 1 || project.max_capacity < project.min_capacity {
                return Err(DatasetError::InvalidCapacity {
                    project: project.id,
                    min: project.min_capacity,
                    max: project.max_capacity,
                });
            }
            if project.required_gpa < 0.0 {
                return Err(DatasetError::NegativeRequiredGpa {
                    project: project.id,
                    required: project.required_gpa,
                });
            }
        }

        let mut ranks_by_student: HashMap<StudentId, HashMap<ProjectId, u8>> = HashMap::new();
        let mut used_ranks: HashMap<StudentId, Vec<u8>> = HashMap::new();
        for pref in &preferences {
            if !position_by_id.contains_key(&pref.student_id) {
                return Err(DatasetError::UnknownPreferenceStudent(pref.student_id));
            }
            if !project_by_id.contains_key(&pref.project_id) {
                return Err(DatasetError::UnknownPreferenceProject {
                    student: pref.student_id,
                    project: pref.project_id,
                });
            }
            if !(1..=5).contains(&pref.rank) {
                return Err(DatasetError::RankOutOfRange {
                    student: pref.student_id,
                    project: pref.project_id,
                    rank: pref.rank,
                });
            }
            let ranks = ranks_by_student.entry(pref.student_id).or_default();
            if ranks.insert(pref.project_id, pref.rank).is_some() {
                return Err(DatasetError::DuplicatePreference {
                    student: pref.student_id,
                    project: pref.project_id,
                });
            }
            let seen = used_ranks.entry(pref.student_id).or_default();
            if seen.contains(&pref.rank) {
                return Err(DatasetError::DuplicateRank {
                    student: pref.student_id,
                    rank: pref.rank,
                });
            }
            seen.push(pref.rank);
        }

        let mut partner_positions = Vec::with_capacity(students.len());
        for student in &students {
            match student.partner_id {
                None => partner_positions.push(None),
                Some(partner_id) => {
                    if partner_id == student.id {
                        return Err(DatasetError::SelfPartner(student.id));
                    }
                    let Some(&partner_position) = position_by_id.get(&partner_id) else {
                        return Err(DatasetError::UnknownPartner {
                            student: student.id,
                            partner: partner_id,
                        });
                    };
                    if students[partner_position].partner_id != Some(student.id) {
                        // Not repaired here; the symmetric side simply won't
                        // participate in partner constraints.
                        tracing::warn!(
                            student = %student.id,
                            partner = %partner_id,
                            "partner pointer is not mirrored"
                        );
                    }
                    partner_positions.push(Some(partner_position));
                }
            }
        }

        let candidate_projects = projects.iter().map(|p| p.id).collect();

        Ok(Self {
            students,
            projects,
            preferences,
            project_by_id,
            position_by_id,
            ranks_by_student,
            partner_positions,
            candidate_projects,
        })
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    /// The student occupying a chromosome position.
    pub fn student_at(&self, position: usize) -> &Student {
        &self.students[position]
    }

    /// Chromosome position of a student id, if the id is known.
    pub fn position_of(&self, id: StudentId) -> Option<usize> {
        self.position_by_id.get(&id).copied()
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.project_by_id.get(&id).map(|&i| &self.projects[i])
    }

    /// Rank a student gave a project, if they ranked it at all.
    pub fn rank_of(&self, student: StudentId, project: ProjectId) -> Option<u8> {
        self.ranks_by_student
            .get(&student)
            .and_then(|ranks| ranks.get(&project))
            .copied()
    }

    /// Partner's chromosome position for the student at `position`.
    pub fn partner_position(&self, position: usize) -> Option<usize> {
        self.partner_positions[position]
    }

    /// Project ids eligible for random assignment.
    pub fn candidate_projects(&self) -> &[ProjectId] {
        &self.candidate_projects
    }

    /// Ids of projects whose GPA floor the given GPA clears.
    pub fn projects_admitting(&self, gpa: f64) -> Vec<ProjectId> {
        self.projects
            .iter()
            .filter(|p| p.admits_gpa(gpa))
            .map(|p| p.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Student> {
        vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9),
            Student::new(StudentId(2), "s-002", "Grace", 3.2),
        ]
    }

    fn catalog() -> Vec<Project> {
        vec![
            Project::new(ProjectId(10), "P1", "Compilers", 1, 3),
            Project::new(ProjectId(20), "P2", "Databases", 1, 3).with_required_gpa(3.5),
        ]
    }

    #[test]
    fn it_builds_index_tables() {
        let prefs = vec![
            Preference::new(StudentId(1), ProjectId(10), 1),
            Preference::new(StudentId(1), ProjectId(20), 2),
        ];
        let dataset = Dataset::new(roster(), catalog(), prefs).unwrap();

        assert_eq!(dataset.student_count(), 2);
        assert_eq!(dataset.position_of(StudentId(2)), Some(1));
        assert_eq!(dataset.rank_of(StudentId(1), ProjectId(20)), Some(2));
        assert_eq!(dataset.rank_of(StudentId(2), ProjectId(10)), None);
        assert_eq!(dataset.project(ProjectId(20)).unwrap().code, "P2");
        assert_eq!(dataset.candidate_projects(), &[ProjectId(10), ProjectId(20)]);
    }

    #[test]
    fn it_links_partner_positions_both_ways() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(2)),
            Student::new(StudentId(2), "s-002", "Grace", 3.2).with_partner(StudentId(1)),
            Student::new(StudentId(3), "s-003", "Edsger", 3.0),
        ];
        let dataset = Dataset::new(students, catalog(), vec![]).unwrap();

        assert_eq!(dataset.partner_position(0), Some(1));
        assert_eq!(dataset.partner_position(1), Some(0));
        assert_eq!(dataset.partner_position(2), None);
    }

    #[test]
    fn it_filters_projects_by_gpa_floor() {
        let dataset = Dataset::new(roster(), catalog(), vec![]).unwrap();
        assert_eq!(dataset.projects_admitting(3.9), vec![ProjectId(10), ProjectId(20)]);
        assert_eq!(dataset.projects_admitting(3.2), vec![ProjectId(10)]);
    }

    #[test]
    fn it_rejects_empty_inputs() {
        assert!(matches!(
            Dataset::new(vec![], catalog(), vec![]),
            Err(DatasetError::NoStudents)
        ));
        assert!(matches!(
            Dataset::new(roster(), vec![], vec![]),
            Err(DatasetError::NoProjects)
        ));
    }

    #[test]
    fn it_rejects_duplicate_ids() {
        let mut students = roster();
        students.push(Student::new(StudentId(1), "s-003", "Dup", 3.0));
        assert!(matches!(
            Dataset::new(students, catalog(), vec![]),
            Err(DatasetError::DuplicateStudent(StudentId(1)))
        ));

        let mut projects = catalog();
        projects.push(Project::new(ProjectId(10), "P3", "Dup", 1, 2));
        assert!(matches!(
            Dataset::new(roster(), projects, vec![]),
            Err(DatasetError::DuplicateProject(ProjectId(10)))
        ));
    }

    #[test]
    fn it_rejects_out_of_range_gpa_and_capacity() {
        let students = vec![Student::new(StudentId(1), "s-001", "Ada", 4.2)];
        assert!(matches!(
            Dataset::new(students, catalog(), vec![]),
            Err(DatasetError::GpaOutOfRange { .. })
        ));

        let projects = vec![Project::new(ProjectId(10), "P1", "Compilers", 3, 2)];
        assert!(matches!(
            Dataset::new(roster(), projects, vec![]),
            Err(DatasetError::InvalidCapacity { .. })
        ));

        let projects = vec![Project::new(ProjectId(10), "P1", "Compilers", 0, 2)];
        assert!(matches!(
            Dataset::new(roster(), projects, vec![]),
            Err(DatasetError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn it_rejects_dangling_preferences() {
        let prefs = vec![Preference::new(StudentId(9), ProjectId(10), 1)];
        assert!(matches!(
            Dataset::new(roster(), catalog(), prefs),
            Err(DatasetError::UnknownPreferenceStudent(StudentId(9)))
        ));

        let prefs = vec![Preference::new(StudentId(1), ProjectId(99), 1)];
        assert!(matches!(
            Dataset::new(roster(), catalog(), prefs),
            Err(DatasetError::UnknownPreferenceProject { .. })
        ));
    }

    #[test]
    fn it_rejects_rank_misuse() {
        let prefs = vec![Preference::new(StudentId(1), ProjectId(10), 6)];
        assert!(matches!(
            Dataset::new(roster(), catalog(), prefs),
            Err(DatasetError::RankOutOfRange { .. })
        ));

        let prefs = vec![
            Preference::new(StudentId(1), ProjectId(10), 1),
            Preference::new(StudentId(1), ProjectId(10), 2),
        ];
        assert!(matches!(
            Dataset::new(roster(), catalog(), prefs),
            Err(DatasetError::DuplicatePreference { .. })
        ));

        let prefs = vec![
            Preference::new(StudentId(1), ProjectId(10), 1),
            Preference::new(StudentId(1), ProjectId(20), 1),
        ];
        assert!(matches!(
            Dataset::new(roster(), catalog(), prefs),
            Err(DatasetError::DuplicateRank { .. })
        ));
    }

    #[test]
    fn it_rejects_bad_partner_pointers() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(9)),
            Student::new(StudentId(2), "s-002", "Grace", 3.2),
        ];
        assert!(matches!(
            Dataset::new(students, catalog(), vec![]),
            Err(DatasetError::UnknownPartner { .. })
        ));

        let students = vec![Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(1))];
        assert!(matches!(
            Dataset::new(students, catalog(), vec![]),
            Err(DatasetError::SelfPartner(StudentId(1)))
        ));
    }
}
