use super::principal::{Principal, Role};
use super::{Action, Resource, Scope};

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Scope),
    Deny,
}

/// Policy evaluator trait for pluggable authorization logic
pub trait PolicyEvaluator: Send + Sync {
    /// Decide whether the principal may perform `action` on `resource`, and with what visibility.
    fn decide(&self, principal: &Principal, action: Action, resource: Resource) -> Decision;
}

/// The portal's role table.
///
/// | Resource              | admin          | course_advisor      | student            |
/// |-----------------------|----------------|---------------------|--------------------|
/// | Department, Batch     | CRUD           | -                   | -                  |
/// | CourseAdvisor         | CRUD           | read                | -                  |
/// | Student               | CRUD           | -                   | read/update own    |
/// | Internship            | list/read      | list/read own batch | CRUD own           |
/// | InternshipCoverage    | list           | list own batch      | -                  |
/// | StudentCv             | read           | read own batch      | read/write own     |
/// | InternshipFile        | read           | read own batch      | read/write own     |
/// | StudentProfile        | -              | -                   | read own           |
/// | CourseAdvisorProfile  | -              | read own            | -                  |
/// | StudentIdentity       | update         | -                   | -                  |
#[derive(Debug, Clone, Default)]
pub struct DefaultPolicy;

impl DefaultPolicy {
    pub fn new() -> Self {
        Self
    }

    fn admin(action: Action, resource: Resource) -> Decision {
        use Action::*;
        use Resource::*;

        match (resource, action) {
            (Department | Batch | CourseAdvisor | Student | StudentIdentity, _) => Decision::Allow(Scope::All),
            (Internship | InternshipCoverage | StudentCv | InternshipFile, List | Read) => {
                Decision::Allow(Scope::All)
            }
            _ => Decision::Deny,
        }
    }

    fn course_advisor(principal: &Principal, action: Action, resource: Resource) -> Decision {
        use Action::*;
        use Resource::*;

        let Some(batch_id) = principal.batch_id else {
            return Decision::Deny;
        };

        match (resource, action) {
            (CourseAdvisor, Read) => Decision::Allow(Scope::All),
            (CourseAdvisorProfile, Read) => Decision::Allow(Scope::Batch(batch_id)),
            (Internship | InternshipCoverage | StudentCv | InternshipFile, List | Read) => {
                Decision::Allow(Scope::Batch(batch_id))
            }
            _ => Decision::Deny,
        }
    }

    fn student(principal: &Principal, action: Action, resource: Resource) -> Decision {
        use Action::*;
        use Resource::*;

        let own = Decision::Allow(Scope::Student(principal.subject_id));

        match (resource, action) {
            (Student | StudentProfile, Read) => own,
            (Student, Update) => own,
            (Internship | StudentCv | InternshipFile, _) => own,
            _ => Decision::Deny,
        }
    }
}

impl PolicyEvaluator for DefaultPolicy {
    fn decide(&self, principal: &Principal, action: Action, resource: Resource) -> Decision {
        let decision = match principal.role {
            Role::Admin => Self::admin(action, resource),
            Role::CourseAdvisor => Self::course_advisor(principal, action, resource),
            Role::Student => Self::student(principal, action, resource),
        };

        if decision == Decision::Deny {
            tracing::debug!(
                role = principal.role.as_str(),
                subject_id = principal.subject_id,
                action = ?action,
                resource = resource.as_str(),
                "permission denied"
            );
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [Action; 5] = [Action::Create, Action::List, Action::Read, Action::Update, Action::Delete];

    #[test]
    fn admin_manages_the_structure() {
        let policy = DefaultPolicy::new();
        let admin = Principal::admin(1);

        for resource in [Resource::Department, Resource::Batch, Resource::CourseAdvisor, Resource::Student] {
            for action in ALL_ACTIONS {
                assert_eq!(policy.decide(&admin, action, resource), Decision::Allow(Scope::All));
            }
        }
    }

    #[test]
    fn admin_only_reads_internships() {
        let policy = DefaultPolicy::new();
        let admin = Principal::admin(1);

        assert_eq!(policy.decide(&admin, Action::List, Resource::Internship), Decision::Allow(Scope::All));
        assert_eq!(policy.decide(&admin, Action::Read, Resource::InternshipFile), Decision::Allow(Scope::All));
        assert_eq!(policy.decide(&admin, Action::Create, Resource::Internship), Decision::Deny);
        assert_eq!(policy.decide(&admin, Action::Update, Resource::StudentCv), Decision::Deny);
    }

    #[test]
    fn profiles_belong_to_their_own_role() {
        let policy = DefaultPolicy::new();
        let admin = Principal::admin(1);
        let advisor = Principal::course_advisor(4, 9);
        let student = Principal::student(12, 9);

        assert_eq!(
            policy.decide(&student, Action::Read, Resource::StudentProfile),
            Decision::Allow(Scope::Student(12))
        );
        assert_eq!(
            policy.decide(&advisor, Action::Read, Resource::CourseAdvisorProfile),
            Decision::Allow(Scope::Batch(9))
        );
        assert_eq!(policy.decide(&advisor, Action::Read, Resource::StudentProfile), Decision::Deny);
        assert_eq!(policy.decide(&student, Action::Read, Resource::CourseAdvisorProfile), Decision::Deny);
        assert_eq!(policy.decide(&admin, Action::Read, Resource::StudentProfile), Decision::Deny);
        assert_eq!(policy.decide(&admin, Action::Read, Resource::CourseAdvisorProfile), Decision::Deny);
    }

    #[test]
    fn only_admins_change_student_identity() {
        let policy = DefaultPolicy::new();

        assert_eq!(
            policy.decide(&Principal::admin(1), Action::Update, Resource::StudentIdentity),
            Decision::Allow(Scope::All)
        );
        assert_eq!(
            policy.decide(&Principal::student(12, 9), Action::Update, Resource::StudentIdentity),
            Decision::Deny
        );
        assert_eq!(
            policy.decide(&Principal::course_advisor(4, 9), Action::Update, Resource::StudentIdentity),
            Decision::Deny
        );
    }

    #[test]
    fn advisor_sees_only_its_batch() {
        let policy = DefaultPolicy::new();
        let advisor = Principal::course_advisor(4, 9);

        assert_eq!(policy.decide(&advisor, Action::List, Resource::Internship), Decision::Allow(Scope::Batch(9)));
        assert_eq!(policy.decide(&advisor, Action::Read, Resource::StudentCv), Decision::Allow(Scope::Batch(9)));
        assert_eq!(
            policy.decide(&advisor, Action::List, Resource::InternshipCoverage),
            Decision::Allow(Scope::Batch(9))
        );
        assert_eq!(policy.decide(&advisor, Action::Read, Resource::CourseAdvisor), Decision::Allow(Scope::All));
        assert_eq!(policy.decide(&advisor, Action::Update, Resource::CourseAdvisor), Decision::Deny);
        assert_eq!(policy.decide(&advisor, Action::Read, Resource::Student), Decision::Deny);
        assert_eq!(policy.decide(&advisor, Action::Delete, Resource::Internship), Decision::Deny);
    }

    #[test]
    fn advisor_without_batch_is_denied() {
        let policy = DefaultPolicy::new();
        let advisor = Principal {
            role: Role::CourseAdvisor,
            subject_id: 4,
            batch_id: None,
        };

        assert_eq!(policy.decide(&advisor, Action::List, Resource::Internship), Decision::Deny);
    }

    #[test]
    fn student_owns_its_rows() {
        let policy = DefaultPolicy::new();
        let student = Principal::student(12, 9);
        let own = Decision::Allow(Scope::Student(12));

        for action in ALL_ACTIONS {
            assert_eq!(policy.decide(&student, action, Resource::Internship), own);
            assert_eq!(policy.decide(&student, action, Resource::StudentCv), own);
        }
        assert_eq!(policy.decide(&student, Action::Read, Resource::Student), own);
        assert_eq!(policy.decide(&student, Action::Update, Resource::Student), own);
        assert_eq!(policy.decide(&student, Action::Delete, Resource::Student), Decision::Deny);
        assert_eq!(policy.decide(&student, Action::List, Resource::Student), Decision::Deny);
        assert_eq!(policy.decide(&student, Action::List, Resource::InternshipCoverage), Decision::Deny);
        assert_eq!(policy.decide(&student, Action::Read, Resource::Batch), Decision::Deny);
    }
}
