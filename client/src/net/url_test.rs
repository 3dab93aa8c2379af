use super::*;

#[test]
fn http_base_becomes_ws() {
    let url = endpoint_url("http://localhost:3000", "p1", "secret").expect("valid base");
    assert_eq!(url, "ws://localhost:3000/ws/collab/p1/?token=secret");
}

#[test]
fn https_base_becomes_wss() {
    let url = endpoint_url("https://ide.example.com/", "p1", "t").expect("valid base");
    assert_eq!(url, "wss://ide.example.com/ws/collab/p1/?token=t");
}

#[test]
fn ws_bases_pass_through() {
    assert_eq!(
        endpoint_url("ws://h:1", "p", "t").expect("valid base"),
        "ws://h:1/ws/collab/p/?token=t"
    );
    assert_eq!(
        endpoint_url("wss://h", "p", "t").expect("valid base"),
        "wss://h/ws/collab/p/?token=t"
    );
}

#[test]
fn base_path_is_kept() {
    let url = endpoint_url("https://h/ide/", "p", "t").expect("valid base");
    assert_eq!(url, "wss://h/ide/ws/collab/p/?token=t");
}

#[test]
fn project_and_token_are_percent_encoded() {
    let url = endpoint_url("http://h", "my project/1", "a+b=c&d").expect("valid base");
    assert_eq!(url, "ws://h/ws/collab/my%20project%2F1/?token=a%2Bb%3Dc%26d");
}

#[test]
fn unreserved_characters_are_kept() {
    let url = endpoint_url("http://h", "proj-1_a.b~c", "t").expect("valid base");
    assert_eq!(url, "ws://h/ws/collab/proj-1_a.b~c/?token=t");
}

#[test]
fn other_schemes_are_rejected() {
    for base in ["ftp://h", "localhost:3000", "", "http://"] {
        assert!(
            matches!(endpoint_url(base, "p", "t"), Err(ClientError::InvalidBaseUrl(_))),
            "expected {base:?} to be rejected"
        );
    }
}
