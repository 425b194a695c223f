//! Tests for the account service.

use super::*;
use crate::domain::ports::{
    MockAuthSessionRepository, MockReviewRepository, MockSkillRepository,
    MockTwoFactorRepository, MockUserRepository, UserRepositoryError,
};
use crate::domain::{DisplayName, Email, ErrorCode, Timezone, TotpSecret, TwoFactorSettings};
use crate::test_support::MutableClock;
use chrono::Utc;
use rstest::{fixture, rstest};

struct Mocks {
    users: MockUserRepository,
    sessions: MockAuthSessionRepository,
    two_factor: MockTwoFactorRepository,
    reviews: MockReviewRepository,
    skills: MockSkillRepository,
}

#[fixture]
fn mocks() -> Mocks {
    Mocks {
        users: MockUserRepository::new(),
        sessions: MockAuthSessionRepository::new(),
        two_factor: MockTwoFactorRepository::new(),
        reviews: MockReviewRepository::new(),
        skills: MockSkillRepository::new(),
    }
}

fn service(mocks: Mocks, clock: Arc<MutableClock>) -> Accounts {
    Accounts::new(
        Arc::new(mocks.users),
        Arc::new(mocks.sessions),
        Arc::new(mocks.two_factor),
        Arc::new(mocks.reviews),
        Arc::new(mocks.skills),
        clock,
        Duration::hours(24),
    )
}

fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::at(2030, 1, 7, 9))
}

fn user(role: Role, approved: bool) -> User {
    User {
        id: UserId::random(),
        email: Email::new("grace@example.com").expect("email"),
        display_name: DisplayName::new("Grace").expect("name"),
        role,
        bio: String::new(),
        timezone: Timezone::utc(),
        hourly_rate_cents: Some(6000),
        is_mentor_approved: approved,
        created_at: Utc::now(),
    }
}

fn registration(role: Role) -> Registration {
    Registration {
        email: Email::new("ada@example.com").expect("email"),
        password: Password::new("correct horse").expect("password"),
        display_name: DisplayName::new("Ada").expect("name"),
        role,
        timezone: Timezone::utc(),
        hourly_rate_cents: None,
    }
}

#[rstest]
#[tokio::test]
async fn admins_cannot_self_register(mocks: Mocks) {
    let err = service(mocks, clock())
        .register(registration(Role::Admin))
        .await
        .expect_err("admin rejected");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn mentors_register_unapproved(mut mocks: Mocks) {
    mocks
        .users
        .expect_create()
        .withf(|user, hash| !user.is_mentor_approved && hash.as_ref().starts_with("$argon2"))
        .times(1)
        .return_once(|_, _| Ok(()));

    let user = service(mocks, clock())
        .register(registration(Role::Mentor))
        .await
        .expect("registered");

    assert_eq!(user.role, Role::Mentor);
    assert!(!user.is_mentor_approved);
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_conflict(mut mocks: Mocks) {
    mocks
        .users
        .expect_create()
        .return_once(|_, _| Err(UserRepositoryError::duplicate_email()));

    let err = service(mocks, clock())
        .register(registration(Role::Learner))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case::unknown_email(None)]
#[case::wrong_password(Some("another password"))]
#[tokio::test]
async fn bad_credentials_share_one_message(
    mut mocks: Mocks,
    #[case] stored_password: Option<&'static str>,
) {
    let stored = stored_password.map(|raw| {
        let hash = PasswordHash::hash(&Password::new(raw).expect("password")).expect("hash");
        (user(Role::Learner, false), hash)
    });
    mocks
        .users
        .expect_find_credentials()
        .return_once(move |_| Ok(stored));
    mocks.sessions.expect_insert().never();

    let credentials =
        LoginCredentials::try_from_parts("grace@example.com", "correct horse").expect("creds");
    let err = service(mocks, clock())
        .login(&credentials)
        .await
        .expect_err("rejected");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), INVALID_CREDENTIALS);
}

#[rstest]
#[tokio::test]
async fn login_issues_a_token_that_expires(mut mocks: Mocks) {
    let hash = PasswordHash::hash(&Password::new("correct horse").expect("password"))
        .expect("hash");
    let account = user(Role::Learner, false);
    mocks
        .users
        .expect_find_credentials()
        .return_once(move |_| Ok(Some((account, hash))));
    mocks.two_factor.expect_find().return_once(|_| Ok(None));
    mocks
        .sessions
        .expect_insert()
        .withf(|session| !session.revoked)
        .times(1)
        .return_once(|_| Ok(()));
    let clock = clock();

    let credentials =
        LoginCredentials::try_from_parts("grace@example.com", "correct horse").expect("creds");
    let LoginOutcome::Issued(issued) = service(mocks, clock.clone())
        .login(&credentials)
        .await
        .expect("login")
    else {
        panic!("expected a session token");
    };

    assert_eq!(issued.expires_at, clock.utc() + Duration::hours(24));
    assert_eq!(issued.token.expose().len(), 64);
}

#[rstest]
#[tokio::test]
async fn expired_tokens_do_not_authenticate(mut mocks: Mocks) {
    let clock = clock();
    let token = BearerToken::generate();
    let session = AuthSession {
        digest: token.digest(),
        user_id: UserId::random(),
        expires_at: clock.utc() - Duration::seconds(1),
        revoked: false,
    };
    mocks
        .sessions
        .expect_find()
        .return_once(move |_| Ok(Some(session)));
    mocks.users.expect_find_by_id().never();

    let err = service(mocks, clock)
        .authenticate(&token)
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn negative_rates_are_rejected_before_loading(mut mocks: Mocks) {
    mocks.users.expect_find_by_id().never();
    let update = ProfileUpdate {
        hourly_rate_cents: Some(-1),
        ..ProfileUpdate::default()
    };

    let err = service(mocks, clock())
        .update_profile(&UserId::random(), update)
        .await
        .expect_err("negative");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn unapproved_mentors_have_no_public_profile(mut mocks: Mocks) {
    let mentor = user(Role::Mentor, false);
    let id = mentor.id;
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(mentor)));

    let err = service(mocks, clock())
        .mentor_profile(&id)
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(Role::Learner, ErrorCode::Forbidden)]
#[case(Role::Mentor, ErrorCode::Forbidden)]
#[tokio::test]
async fn only_admins_approve(mocks: Mocks, #[case] role: Role, #[case] expected: ErrorCode) {
    let actor = Actor {
        user_id: UserId::random(),
        role,
    };
    let err = service(mocks, clock())
        .approve_mentor(&actor, &UserId::random())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn approving_a_learner_is_invalid(mut mocks: Mocks) {
    let learner = user(Role::Learner, false);
    let id = learner.id;
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(learner)));
    mocks.users.expect_update().never();
    let admin = Actor {
        user_id: UserId::random(),
        role: Role::Admin,
    };

    let err = service(mocks, clock())
        .approve_mentor(&admin, &id)
        .await
        .expect_err("not a mentor");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn approval_persists_the_flag(mut mocks: Mocks) {
    let mentor = user(Role::Mentor, false);
    let id = mentor.id;
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(mentor)));
    mocks
        .users
        .expect_update()
        .withf(|user| user.is_mentor_approved)
        .times(1)
        .return_once(|_| Ok(()));
    let admin = Actor {
        user_id: UserId::random(),
        role: Role::Admin,
    };

    let approved = service(mocks, clock())
        .approve_mentor(&admin, &id)
        .await
        .expect("approved");
    assert!(approved.is_mentor_approved);
}

#[rstest]
#[tokio::test]
async fn enabled_second_factor_defers_the_session(mut mocks: Mocks) {
    let hash = PasswordHash::hash(&Password::new("correct horse").expect("password"))
        .expect("hash");
    let account = user(Role::Learner, false);
    let user_id = account.id;
    mocks
        .users
        .expect_find_credentials()
        .return_once(move |_| Ok(Some((account, hash))));
    mocks.two_factor.expect_find().return_once(move |_| {
        let mut settings = TwoFactorSettings::pending(user_id, TotpSecret::generate());
        settings.enabled = true;
        Ok(Some(settings))
    });
    mocks
        .two_factor
        .expect_insert_challenge()
        .withf(move |challenge| challenge.user_id == user_id && challenge.attempts == 0)
        .times(1)
        .return_once(|_| Ok(()));
    mocks.sessions.expect_insert().never();
    let clock = clock();

    let credentials =
        LoginCredentials::try_from_parts("grace@example.com", "correct horse").expect("creds");
    let outcome = service(mocks, clock.clone())
        .login(&credentials)
        .await
        .expect("login");

    let LoginOutcome::ChallengeRequired { expires_at, .. } = outcome else {
        panic!("expected a challenge");
    };
    assert_eq!(expires_at, clock.utc() + Duration::minutes(CHALLENGE_TTL_MINUTES));
}

#[rstest]
#[case(Role::Learner)]
#[case(Role::Mentor)]
#[tokio::test]
async fn only_admins_list_pending_mentors(mut mocks: Mocks, #[case] role: Role) {
    mocks.users.expect_list_pending_mentors().never();
    let actor = Actor {
        user_id: UserId::random(),
        role,
    };
    let err = service(mocks, clock())
        .pending_mentors(&actor)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn admins_see_pending_mentors(mut mocks: Mocks) {
    let waiting = user(Role::Mentor, false);
    let expected = waiting.id;
    mocks
        .users
        .expect_list_pending_mentors()
        .return_once(move || Ok(vec![waiting]));
    let admin = Actor {
        user_id: UserId::random(),
        role: Role::Admin,
    };

    let pending = service(mocks, clock())
        .pending_mentors(&admin)
        .await
        .expect("pending");
    assert_eq!(pending.iter().map(|u| u.id).collect::<Vec<_>>(), vec![expected]);
}

fn change(current: &str, replacement: &str) -> PasswordChange {
    PasswordChange {
        current: Password::new(current).expect("current"),
        replacement: Password::new(replacement).expect("replacement"),
    }
}

#[rstest]
#[tokio::test]
async fn wrong_current_password_changes_nothing(mut mocks: Mocks) {
    let stored = PasswordHash::hash(&Password::new("correct horse").expect("password"))
        .expect("hash");
    mocks
        .users
        .expect_find_password_hash()
        .return_once(move |_| Ok(Some(stored)));
    mocks.users.expect_update_password().never();
    mocks.sessions.expect_revoke_others().never();

    let err = service(mocks, clock())
        .change_password(
            &UserId::random(),
            &BearerToken::generate(),
            change("battery staple", "a brand new secret"),
        )
        .await
        .expect_err("wrong password");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), WRONG_CURRENT_PASSWORD);
    assert_eq!(
        err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
        Some("currentPassword")
    );
}

#[rstest]
#[tokio::test]
async fn password_change_rehashes_and_keeps_only_the_caller_session(mut mocks: Mocks) {
    let user_id = UserId::random();
    let caller = BearerToken::generate();
    let kept = caller.digest();
    let stored = PasswordHash::hash(&Password::new("correct horse").expect("password"))
        .expect("hash");
    mocks
        .users
        .expect_find_password_hash()
        .return_once(move |_| Ok(Some(stored)));
    mocks
        .users
        .expect_update_password()
        .withf(move |id, hash| {
            *id == user_id
                && hash.verify("a brand new secret").unwrap_or(false)
                && !hash.verify("correct horse").unwrap_or(true)
        })
        .times(1)
        .return_once(|_, _| Ok(true));
    mocks
        .sessions
        .expect_revoke_others()
        .withf(move |id, keep| *id == user_id && *keep == kept)
        .times(1)
        .return_once(|_, _| Ok(2));

    service(mocks, clock())
        .change_password(&user_id, &caller, change("correct horse", "a brand new secret"))
        .await
        .expect("changed");
}

#[rstest]
#[tokio::test]
async fn password_change_for_a_vanished_user_is_not_found(mut mocks: Mocks) {
    mocks
        .users
        .expect_find_password_hash()
        .return_once(|_| Ok(None));

    let err = service(mocks, clock())
        .change_password(
            &UserId::random(),
            &BearerToken::generate(),
            change("correct horse", "a brand new secret"),
        )
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
