use super::Chromosome;
use crate::models::{Dataset, ProjectId, StudentId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A project whose head count fell outside its capacity band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityViolation {
    pub project_id: ProjectId,
    pub actual: u32,
    pub min: u32,
    pub max: u32,
    pub underflow: bool,
}

/// A student placed on a project whose GPA floor they do not clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpaViolation {
    pub student_id: StudentId,
    pub project_id: ProjectId,
    pub gpa: f64,
    pub required_gpa: f64,
}

/// A partner pair split across two projects. Reported once per pair, with
/// the lower roster position as `student_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerViolation {
    pub student_id: StudentId,
    pub partner_id: StudentId,
    pub student_project: ProjectId,
    pub partner_project: ProjectId,
}

/// Structured report of every constraint violation in a chromosome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintViolations {
    pub capacity: Vec<CapacityViolation>,
    pub gpa: Vec<GpaViolation>,
    pub partner: Vec<PartnerViolation>,
}

impl ConstraintViolations {
    pub fn total(&self) -> usize {
        self.capacity.len() + self.gpa.len() + self.partner.len()
    }

    pub fn has_violations(&self) -> bool {
        self.total() > 0
    }
}

impl std::fmt::Display for ConstraintViolations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "violations: capacity={} gpa={} partner={}",
            self.capacity.len(),
            self.gpa.len(),
            self.partner.len()
        )
    }
}

/// Detects constraint violations and repairs them best-effort.
///
/// The three constraints are orthogonal:
///
/// 1. **Capacity** - every project's head count sits in its band.
/// 2. **GPA** - every student clears their project's GPA floor.
/// 3. **Partner** - every partner pair shares one project.
///
/// Repair applies Partners → GPA → Capacity, in that order: co-locating a
/// pair may resolve a GPA violation incidentally, and GPA moves shift head
/// counts that the capacity pass then rebalances. Repair never fails:
/// residual violations simply stay in the chromosome and show up as
/// fitness penalties.
#[derive(Debug, Clone)]
pub struct ConstraintChecker<'a> {
    dataset: &'a Dataset,
}

impl<'a> ConstraintChecker<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    /// Whether every project's head count is inside its capacity band.
    pub fn check_capacity(&self, chromosome: &Chromosome) -> bool {
        self.dataset.projects().iter().all(|project| {
            project.is_within_capacity(chromosome.count_in_project(project.id) as u32)
        })
    }

    /// Whether every position clears its project's GPA floor.
    pub fn check_gpa(&self, chromosome: &Chromosome) -> bool {
        (0..chromosome.len()).all(|position| {
            let student = self.dataset.student_at(position);
            match self.dataset.project(chromosome.get(position)) {
                Some(project) => project.admits_gpa(student.gpa),
                None => true,
            }
        })
    }

    /// Whether every partner pair shares one project.
    pub fn check_partners(&self, chromosome: &Chromosome) -> bool {
        (0..chromosome.len()).all(|position| {
            match self.dataset.partner_position(position) {
                Some(partner) => chromosome.get(position) == chromosome.get(partner),
                None => true,
            }
        })
    }

    /// Checks all three constraints and records the verdict in the
    /// chromosome's validity cache.
    pub fn check_all(&self, chromosome: &mut Chromosome) -> bool {
        let valid = self.check_capacity(chromosome)
            && self.check_gpa(chromosome)
            && self.check_partners(chromosome);
        chromosome.set_valid(valid);
        valid
    }

    /// Enumerates every violation without modifying the chromosome.
    pub fn violations(&self, chromosome: &Chromosome) -> ConstraintViolations {
        let mut report = ConstraintViolations::default();

        for project in self.dataset.projects() {
            let actual = chromosome.count_in_project(project.id) as u32;
            if actual < project.min_capacity || actual > project.max_capacity {
                report.capacity.push(CapacityViolation {
                    project_id: project.id,
                    actual,
                    min: project.min_capacity,
                    max: project.max_capacity,
                    underflow: actual < project.min_capacity,
                });
            }
        }

        for position in 0..chromosome.len() {
            let student = self.dataset.student_at(position);
            if let Some(project) = self.dataset.project(chromosome.get(position)) {
                if !project.admits_gpa(student.gpa) {
                    report.gpa.push(GpaViolation {
                        student_id: student.id,
                        project_id: project.id,
                        gpa: student.gpa,
                        required_gpa: project.required_gpa,
                    });
                }
            }
        }

        for position in 0..chromosome.len() {
            if let Some(partner) = self.dataset.partner_position(position) {
                // Lower position reports, so each pair appears once.
                if partner > position && chromosome.get(position) != chromosome.get(partner) {
                    report.partner.push(PartnerViolation {
                        student_id: self.dataset.student_at(position).id,
                        partner_id: self.dataset.student_at(partner).id,
                        student_project: chromosome.get(position),
                        partner_project: chromosome.get(partner),
                    });
                }
            }
        }

        report
    }

    /// Runs the full repair sequence Partners → GPA → Capacity, then
    /// refreshes the validity cache. Returns whether the chromosome ended
    /// up satisfying all constraints.
    #[instrument(level = "debug", skip_all, fields(length = chromosome.len()))]
    pub fn repair<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) -> bool {
        self.repair_partners(chromosome, rng);
        self.repair_gpa(chromosome, rng);
        self.repair_capacity(chromosome, rng);

        self.check_all(chromosome)
    }

    /// Co-locates split partner pairs.
    ///
    /// Each pair lands on the project currently held by the higher-GPA
    /// partner (ties keep the lower position's project). If that project
    /// rejects either GPA, a uniformly random project admitting both is
    /// used instead; if no such project exists the pair is left as-is.
    pub fn repair_partners<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) {
        for position in 0..chromosome.len() {
            let Some(partner) = self.dataset.partner_position(position) else {
                continue;
            };
            if partner <= position || chromosome.get(position) == chromosome.get(partner) {
                continue;
            }

            let student = self.dataset.student_at(position);
            let partner_student = self.dataset.student_at(partner);

            let chosen = if student.gpa >= partner_student.gpa {
                chromosome.get(position)
            } else {
                chromosome.get(partner)
            };

            let Some(project) = self.dataset.project(chosen) else {
                continue;
            };

            if project.admits_gpa(student.gpa) && project.admits_gpa(partner_student.gpa) {
                chromosome.set(position, chosen);
                chromosome.set(partner, chosen);
            } else {
                let floor = student.gpa.min(partner_student.gpa);
                if let Some(fallback) = pick_random(&self.dataset.projects_admitting(floor), rng) {
                    chromosome.set(position, fallback);
                    chromosome.set(partner, fallback);
                }
            }
        }
    }

    /// Moves GPA-violating students to a random admissible project,
    /// dragging their partner along. Returns false when some position had
    /// no admissible project at all.
    pub fn repair_gpa<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) -> bool {
        let mut all_repaired = true;

        for position in 0..chromosome.len() {
            let student = self.dataset.student_at(position);
            let violates = match self.dataset.project(chromosome.get(position)) {
                Some(project) => !project.admits_gpa(student.gpa),
                None => false,
            };
            if !violates {
                continue;
            }

            match pick_random(&self.dataset.projects_admitting(student.gpa), rng) {
                Some(replacement) => {
                    chromosome.set(position, replacement);
                    if let Some(partner) = self.dataset.partner_position(position) {
                        chromosome.set(partner, replacement);
                    }
                }
                None => all_repaired = false,
            }
        }

        all_repaired
    }

    /// Rebalances head counts by moving students out of overflowing
    /// projects, for at most `2·N` iterations.
    ///
    /// Each iteration first tries a deterministic move: the first overflow
    /// project's positions are walked from high index to low, skipping
    /// partnered students, looking for an underflow project that admits the
    /// student. Failing that, a random non-partnered occupant of the first
    /// overflow project is moved to a random admissible project with spare
    /// room. Returns whether capacity constraints hold at the end.
    pub fn repair_capacity<R: Rng>(&self, chromosome: &mut Chromosome, rng: &mut R) -> bool {
        let max_iterations = chromosome.len() * 2;

        for _ in 0..max_iterations {
            let mut overflow = Vec::new();
            let mut underflow = Vec::new();
            for project in self.dataset.projects() {
                let count = chromosome.count_in_project(project.id) as u32;
                if count > project.max_capacity {
                    overflow.push(project.id);
                } else if count < project.min_capacity {
                    underflow.push(project.id);
                }
            }

            if overflow.is_empty() && underflow.is_empty() {
                return true;
            }
            let Some(&first_overflow) = overflow.first() else {
                // Only underflows remain; nothing can be drained without
                // creating a new violation elsewhere.
                break;
            };

            let occupants = chromosome.positions_in_project(first_overflow);
            let mut moved = false;

            for &position in occupants.iter().rev() {
                if self.dataset.partner_position(position).is_some() {
                    continue;
                }
                let student = self.dataset.student_at(position);
                if let Some(&target) = underflow.iter().find(|&&id| {
                    self.dataset
                        .project(id)
                        .is_some_and(|p| p.admits_gpa(student.gpa))
                }) {
                    chromosome.set(position, target);
                    moved = true;
                    break;
                }
            }

            if !moved && !occupants.is_empty() {
                let position = occupants[rng.random_range(0..occupants.len())];
                if self.dataset.partner_position(position).is_none() {
                    let student = self.dataset.student_at(position);
                    let open: Vec<ProjectId> = self
                        .dataset
                        .projects()
                        .iter()
                        .filter(|p| {
                            p.admits_gpa(student.gpa)
                                && (chromosome.count_in_project(p.id) as u32) < p.max_capacity
                        })
                        .map(|p| p.id)
                        .collect();
                    if let Some(target) = pick_random(&open, rng) {
                        chromosome.set(position, target);
                    }
                }
            }
        }

        self.check_capacity(chromosome)
    }
}

fn pick_random<R: Rng>(projects: &[ProjectId], rng: &mut R) -> Option<ProjectId> {
    if projects.is_empty() {
        None
    } else {
        Some(projects[rng.random_range(0..projects.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Preference, Project, Student};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dataset() -> Dataset {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(2)),
            Student::new(StudentId(2), "s-002", "Grace", 3.1).with_partner(StudentId(1)),
            Student::new(StudentId(3), "s-003", "Edsger", 2.5),
            Student::new(StudentId(4), "s-004", "Barbara", 3.6),
        ];
        let projects = vec![
            Project::new(ProjectId(10), "P1", "Compilers", 1, 2),
            Project::new(ProjectId(20), "P2", "Databases", 1, 2).with_required_gpa(3.0),
            Project::new(ProjectId(30), "P3", "Graphics", 1, 2),
        ];
        let preferences = vec![Preference::new(StudentId(1), ProjectId(10), 1)];
        Dataset::new(students, projects, preferences).unwrap()
    }

    #[test]
    fn it_checks_the_three_constraints_independently() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);

        // Pair together, GPAs fine, capacity balanced.
        let valid = Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(30), ProjectId(20)]);
        assert!(checker.check_capacity(&valid));
        assert!(checker.check_gpa(&valid));
        assert!(checker.check_partners(&valid));

        // Edsger (2.5) on the gated project.
        let gpa_bad = Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(20), ProjectId(30)]);
        assert!(!checker.check_gpa(&gpa_bad));

        // Pair split.
        let split = Chromosome::new(vec![ProjectId(10), ProjectId(30), ProjectId(30), ProjectId(20)]);
        assert!(!checker.check_partners(&split));

        // Three students on a max-2 project.
        let crowded = Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(10), ProjectId(20)]);
        assert!(!checker.check_capacity(&crowded));
    }

    #[test]
    fn check_all_updates_the_validity_cache() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);

        let mut valid = Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(30), ProjectId(20)]);
        assert!(checker.check_all(&mut valid));
        assert_eq!(valid.validity(), Some(true));

        let mut invalid = Chromosome::new(vec![ProjectId(10), ProjectId(30), ProjectId(30), ProjectId(20)]);
        assert!(!checker.check_all(&mut invalid));
        assert_eq!(invalid.validity(), Some(false));
    }

    #[test]
    fn violations_report_is_structured_and_deduplicated() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);

        // Pair split, Edsger GPA-violating on P2, P2 crowded (3 > 2), P3 empty.
        let chromosome = Chromosome::new(vec![ProjectId(10), ProjectId(20), ProjectId(20), ProjectId(20)]);
        let report = checker.violations(&chromosome);

        assert_eq!(report.partner.len(), 1);
        assert_eq!(report.partner[0].student_id, StudentId(1));
        assert_eq!(report.partner[0].partner_id, StudentId(2));

        assert_eq!(report.gpa.len(), 1);
        assert_eq!(report.gpa[0].student_id, StudentId(3));
        assert_eq!(report.gpa[0].required_gpa, 3.0);

        let underflows: Vec<_> = report.capacity.iter().filter(|v| v.underflow).collect();
        let overflows: Vec<_> = report.capacity.iter().filter(|v| !v.underflow).collect();
        assert_eq!(overflows.len(), 1);
        assert_eq!(overflows[0].project_id, ProjectId(20));
        assert_eq!(overflows[0].actual, 3);
        assert_eq!(underflows.len(), 1);
        assert_eq!(underflows[0].project_id, ProjectId(30));

        assert!(report.has_violations());
        assert_eq!(report.total(), 4);
    }

    #[test]
    fn partner_repair_prefers_the_higher_gpa_side() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        // Ada (3.9) on P1, Grace (3.1) on P3. Ada's project wins and
        // admits both.
        let mut chromosome =
            Chromosome::new(vec![ProjectId(10), ProjectId(30), ProjectId(30), ProjectId(20)]);
        checker.repair_partners(&mut chromosome, &mut rng);

        assert_eq!(chromosome.get(0), ProjectId(10));
        assert_eq!(chromosome.get(1), ProjectId(10));
    }

    #[test]
    fn partner_repair_falls_back_when_the_chosen_project_rejects_one_side() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(2)),
            Student::new(StudentId(2), "s-002", "Grace", 2.0).with_partner(StudentId(1)),
        ];
        let projects = vec![
            Project::new(ProjectId(10), "P1", "Gated", 1, 2).with_required_gpa(3.5),
            Project::new(ProjectId(20), "P2", "Open", 1, 2),
        ];
        let dataset = Dataset::new(students, projects, vec![]).unwrap();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        // Higher-GPA Ada holds the gated project, but Grace can't join it;
        // the only project admitting min(3.9, 2.0) is P2.
        let mut chromosome = Chromosome::new(vec![ProjectId(10), ProjectId(20)]);
        checker.repair_partners(&mut chromosome, &mut rng);

        assert_eq!(chromosome.get(0), ProjectId(20));
        assert_eq!(chromosome.get(1), ProjectId(20));
    }

    #[test]
    fn partner_repair_leaves_impossible_pairs_unchanged() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 3.9).with_partner(StudentId(2)),
            Student::new(StudentId(2), "s-002", "Grace", 1.0).with_partner(StudentId(1)),
        ];
        // Every project rejects Grace.
        let projects = vec![
            Project::new(ProjectId(10), "P1", "Gated", 1, 2).with_required_gpa(3.0),
            Project::new(ProjectId(20), "P2", "Gated", 1, 2).with_required_gpa(2.0),
        ];
        let dataset = Dataset::new(students, projects, vec![]).unwrap();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        let mut chromosome = Chromosome::new(vec![ProjectId(10), ProjectId(20)]);
        checker.repair_partners(&mut chromosome, &mut rng);

        assert_eq!(chromosome.assignments(), &[ProjectId(10), ProjectId(20)]);
    }

    #[test]
    fn gpa_repair_moves_the_student_and_reports_unresolvable_positions() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        // Edsger (2.5) on the gated P2.
        let mut chromosome =
            Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(20), ProjectId(30)]);
        assert!(checker.repair_gpa(&mut chromosome, &mut rng));
        assert_ne!(chromosome.get(2), ProjectId(20));

        // A student below every floor is unresolvable.
        let students = vec![Student::new(StudentId(1), "s-001", "Low", 1.0)];
        let projects = vec![Project::new(ProjectId(10), "P1", "Gated", 1, 1).with_required_gpa(2.0)];
        let dataset = Dataset::new(students, projects, vec![]).unwrap();
        let checker = ConstraintChecker::new(&dataset);

        let mut chromosome = Chromosome::new(vec![ProjectId(10)]);
        assert!(!checker.repair_gpa(&mut chromosome, &mut rng));
        assert_eq!(chromosome.get(0), ProjectId(10));
    }

    #[test]
    fn gpa_repair_drags_the_partner_along() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Ada", 2.0).with_partner(StudentId(2)),
            Student::new(StudentId(2), "s-002", "Grace", 2.0).with_partner(StudentId(1)),
        ];
        let projects = vec![
            Project::new(ProjectId(10), "P1", "Gated", 1, 2).with_required_gpa(3.0),
            Project::new(ProjectId(20), "P2", "Open", 1, 2),
        ];
        let dataset = Dataset::new(students, projects, vec![]).unwrap();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        let mut chromosome = Chromosome::new(vec![ProjectId(10), ProjectId(10)]);
        checker.repair_gpa(&mut chromosome, &mut rng);

        assert_eq!(chromosome.get(0), ProjectId(20));
        assert_eq!(chromosome.get(1), ProjectId(20));
    }

    #[test]
    fn capacity_repair_rebalances_overflow_into_underflow() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        // Everyone unpartnered piled onto P1 except the pair; P1 holds
        // Edsger + Barbara + nobody else... pile all four on P1.
        let mut chromosome =
            Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(10), ProjectId(10)]);
        let repaired = checker.repair_capacity(&mut chromosome, &mut rng);

        assert!(repaired);
        assert!(checker.check_capacity(&chromosome));
        // The partnered pair never moves during capacity repair.
        assert_eq!(chromosome.get(0), ProjectId(10));
        assert_eq!(chromosome.get(1), ProjectId(10));
    }

    #[test]
    fn repair_of_a_valid_chromosome_is_identity() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        let mut chromosome =
            Chromosome::new(vec![ProjectId(10), ProjectId(10), ProjectId(30), ProjectId(20)]);
        let before = chromosome.assignments().to_vec();

        assert!(checker.repair(&mut chromosome, &mut rng));
        assert_eq!(chromosome.assignments(), &before[..]);
        assert_eq!(chromosome.validity(), Some(true));
    }

    #[test]
    fn full_repair_fixes_a_thoroughly_broken_chromosome() {
        let dataset = dataset();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(7);

        // Split pair, Edsger on the gated project, P2 overloaded.
        let mut chromosome =
            Chromosome::new(vec![ProjectId(20), ProjectId(30), ProjectId(20), ProjectId(20)]);
        let valid = checker.repair(&mut chromosome, &mut rng);

        assert!(valid);
        assert!(chromosome.is_valid());
        assert!(checker.check_partners(&chromosome));
        assert!(checker.check_gpa(&chromosome));
        assert!(checker.check_capacity(&chromosome));
    }

    #[test]
    fn repair_with_unreachable_gpa_leaves_the_penalty_in_place() {
        let students = vec![
            Student::new(StudentId(1), "s-001", "Low", 1.5),
            Student::new(StudentId(2), "s-002", "Ok", 3.5),
        ];
        let projects = vec![
            Project::new(ProjectId(10), "P1", "Gated", 1, 2).with_required_gpa(2.0),
            Project::new(ProjectId(20), "P2", "Gated", 1, 2).with_required_gpa(3.0),
        ];
        let dataset = Dataset::new(students, projects, vec![]).unwrap();
        let checker = ConstraintChecker::new(&dataset);
        let mut rng = StdRng::seed_from_u64(42);

        let mut chromosome = Chromosome::new(vec![ProjectId(10), ProjectId(20)]);
        let valid = checker.repair(&mut chromosome, &mut rng);

        assert!(!valid);
        assert!(!chromosome.is_valid());
        let report = checker.violations(&chromosome);
        assert_eq!(report.gpa.len(), 1);
        assert_eq!(report.gpa[0].student_id, StudentId(1));
    }
}
