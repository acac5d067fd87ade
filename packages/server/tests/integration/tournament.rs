use crate::common::{TestApp, routes};

#[tokio::test]
async fn lists_only_active_tournaments_by_sort_order() {
    let app = TestApp::spawn().await;
    app.insert_tournament("Autumn Cup", true, 3).await;
    app.insert_tournament("Archived", false, 1).await;
    app.insert_tournament("Winter Open", true, 2).await;
    app.insert_tournament("Summer Open", true, 2).await;

    let res = app.get(routes::TOURNAMENTS).await;

    assert_eq!(res.status, 200);
    let names: Vec<&str> = res.body["tournaments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Winter Open", "Summer Open", "Autumn Cup"]);
}

#[tokio::test]
async fn empty_when_no_tournaments() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::TOURNAMENTS).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["tournaments"].as_array().unwrap().len(), 0);
}
