use signed_session::{sign, unsign, Secret};
use test_case::test_case;

const VALUE: &str = "123cookieValue";

#[test_case(Secret::new("mySecretKey"); "single secret")]
#[test_case(Secret::rotating(["mySecretKeyFirst"]).unwrap(); "list of one")]
#[test_case(Secret::rotating(["mySecretKeyFirst", "mySecretKeySecond"]).unwrap(); "list of two")]
fn sign_and_unsign(secret: Secret) {
    let signed = sign(VALUE, &secret);
    assert!(signed.starts_with("123cookieValue."));
    assert!(!signed.contains('='));
    assert_eq!(unsign(&signed, &secret).as_deref(), Some(VALUE));
}

#[test_case(Secret::new("mySecretKey"); "single secret")]
#[test_case(Secret::rotating(["mySecretKeyFirst", "mySecretKeySecond"]).unwrap(); "list of two")]
fn rejects_truncated_and_empty_tokens(secret: Secret) {
    let signed = sign(VALUE, &secret);
    assert_eq!(unsign(&signed[signed.len() - 1..], &secret), None);
    assert_eq!(unsign(&signed[..signed.len() - 1], &secret), None);
    assert_eq!(unsign("", &secret), None);
    assert_eq!(unsign("noseparator", &secret), None);
}

#[test]
fn rejects_tampered_value() {
    let secret = Secret::new("mySecretKey");
    let signed = sign(VALUE, &secret);
    let (_, signature) = signed.rsplit_once('.').unwrap();
    let tampered = format!("differentValue.{signature}");
    assert_eq!(unsign(&tampered, &secret), None);
}

#[test]
fn rejects_wrong_secret() {
    let signed = sign(VALUE, &Secret::new("secret-one"));
    assert_eq!(unsign(&signed, &Secret::new("secret-two")), None);
}

#[test]
fn signing_is_deterministic() {
    let secret = Secret::new("mySecretKey");
    assert_eq!(sign(VALUE, &secret), sign(VALUE, &secret));
}

#[test]
fn signs_with_first_secret_only() {
    let rotating = Secret::rotating(["first", "second"]).unwrap();
    assert_eq!(sign(VALUE, &rotating), sign(VALUE, &Secret::new("first")));
    assert_ne!(sign(VALUE, &rotating), sign(VALUE, &Secret::new("second")));
}

#[test]
fn verifies_with_any_secret_in_rotation() {
    let signed = sign(VALUE, &Secret::new("mySecretKeySecond"));

    let all = Secret::rotating(["mySecretKeyFirst", "mySecretKeySecond", "mySecretKeyThird"]).unwrap();
    assert_eq!(unsign(&signed, &all).as_deref(), Some(VALUE));

    let without_second = Secret::rotating(["mySecretKeyFirst", "mySecretKeyThird"]).unwrap();
    assert_eq!(unsign(&signed, &without_second), None);
}

#[test]
fn empty_rotation_is_invalid() {
    let secrets: Vec<String> = Vec::new();
    assert!(Secret::rotating(secrets).is_err());
}
