use reqwest::multipart::Form;
use server::config::ImageConfig;

use crate::common::{TestApp, image_part, png, product_form, routes};

async fn fetch_image(app: &TestApp, reference: &str) -> (u16, Vec<u8>) {
    let res = app.get_raw(&routes::image(reference), None).await;
    let status = res.status().as_u16();
    (status, res.bytes().await.unwrap().to_vec())
}

fn gallery_refs(body: &serde_json::Value) -> Vec<String> {
    body["gallery_images"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|v| v.as_str().unwrap().to_string())
                .collect()
        })
        .unwrap_or_default()
}

mod product_store {
    use super::*;

    #[tokio::test]
    async fn creates_product_with_images() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let form = product_form("Team jersey", tournament)
            .text("description", "Home kit")
            .text("sku", "JER-001")
            .part("image", image_part("front.png", png("front")))
            .part("gallery_images[]", image_part("g1.png", png("g1")))
            .part("gallery_images[]", image_part("g2.png", png("g2")));
        let res = app.create_product(form).await;

        assert_eq!(res.body["message"], "Product created successfully.");
        let product = &res.body["product"];
        assert_eq!(product["name"], "Team jersey");
        assert_eq!(product["price"], "19.90");
        assert_eq!(product["stock"], 5);
        assert_eq!(product["sku"], "JER-001");
        assert_eq!(product["is_active"], true);

        let image = product["image"].as_str().unwrap();
        assert!(image.starts_with("products/"));
        assert_eq!(fetch_image(&app, image).await, (200, png("front")));

        let gallery = gallery_refs(product);
        assert_eq!(gallery.len(), 2);
        assert_eq!(fetch_image(&app, &gallery[0]).await, (200, png("g1")));
        assert_eq!(fetch_image(&app, &gallery[1]).await, (200, png("g2")));
        assert_eq!(app.blob_count(), 3);
    }

    #[tokio::test]
    async fn creates_product_without_images() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let res = app
            .create_product(product_form("Sticker", tournament).text("is_active", "0"))
            .await;

        let product = &res.body["product"];
        assert!(product["image"].is_null());
        assert!(product["gallery_images"].is_null());
        assert_eq!(product["is_active"], false);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn rejects_invalid_fields_without_storing_images() {
        let app = TestApp::spawn().await;

        let form = Form::new()
            .text("name", "")
            .text("price", "-1")
            .text("stock", "-2")
            .text("tournament_id", "999")
            .part("image", image_part("front.png", png("front")));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 422, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let fields = &res.body["fields"];
        assert_eq!(fields["name"][0], "The name field is required.");
        assert_eq!(fields["price"][0], "The price field must be at least 0.");
        assert_eq!(fields["stock"][0], "The stock field must be at least 0.");
        assert_eq!(fields["tournament_id"][0], "The selected tournament id is invalid.");
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn rejects_non_image_upload() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let form = product_form("Doc", tournament)
            .part("gallery_images", image_part("ok.png", png("ok")))
            .part("gallery_images", image_part("doc.pdf", b"%PDF-1.7".to_vec()));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 422);
        assert!(res.body["fields"]["gallery_images.1"].is_array());
        assert!(res.body["fields"]["gallery_images.0"].is_null());
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn rejects_oversized_image() {
        let app = TestApp::spawn_with(ImageConfig {
            max_size_kb: 1,
            ..Default::default()
        })
        .await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let mut big = png("big");
        big.resize(4096, 0);
        let form = product_form("Poster", tournament).part("image", image_part("big.png", big));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 422);
        assert_eq!(
            res.body["fields"]["image"][0],
            "The image field must not be greater than 1 kilobytes."
        );
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn gallery_errors_keep_request_positions() {
        let app = TestApp::spawn_with(ImageConfig {
            max_size_kb: 1,
            ..Default::default()
        })
        .await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let mut big = png("big");
        big.resize(4096, 0);
        let form = product_form("Poster", tournament)
            .part("gallery_images[]", image_part("big.png", big))
            .part("gallery_images[]", image_part("ok.png", png("ok")))
            .part("gallery_images[]", image_part("doc.pdf", b"%PDF-1.7".to_vec()));
        let res = app.post_form(routes::PRODUCTS, form).await;

        assert_eq!(res.status, 422, "{}", res.text);
        let fields = &res.body["fields"];
        assert_eq!(fields["gallery_images.0"].as_array().unwrap().len(), 1);
        assert!(fields["gallery_images.1"].is_null());
        assert_eq!(fields["gallery_images.2"].as_array().unwrap().len(), 1);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn rejects_duplicate_sku() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        app.create_product(product_form("First", tournament).text("sku", "DUP"))
            .await;
        let res = app
            .post_form(
                routes::PRODUCTS,
                product_form("Second", tournament).text("sku", "DUP"),
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["fields"]["sku"][0], "The sku has already been taken.");
    }

    #[tokio::test]
    async fn rejects_non_multipart_body() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::PRODUCTS))
            .json(&serde_json::json!({ "name": "x" }))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod product_update {
    use super::*;

    #[tokio::test]
    async fn replaces_primary_image() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Cap", tournament).part("image", image_part("old.png", png("old"))),
            )
            .await;
        let id = created.product_id();
        let old = created.body["product"]["image"].as_str().unwrap().to_string();

        let res = app
            .put_form(
                &routes::product(id),
                product_form("Cap", tournament).part("image", image_part("new.png", png("new"))),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Product updated successfully.");
        let new = res.body["product"]["image"].as_str().unwrap();
        assert_ne!(new, old);
        assert_eq!(fetch_image(&app, new).await, (200, png("new")));
        assert_eq!(fetch_image(&app, &old).await.0, 404);
        assert_eq!(app.blob_count(), 1);
    }

    #[tokio::test]
    async fn replaces_whole_gallery_via_post() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Flag", tournament)
                    .part("gallery_images[]", image_part("a.png", png("a")))
                    .part("gallery_images[]", image_part("b.png", png("b"))),
            )
            .await;
        let id = created.product_id();
        let old = gallery_refs(&created.body["product"]);

        let res = app
            .post_form(
                &routes::product(id),
                product_form("Flag", tournament)
                    .part("gallery_images[]", image_part("c.png", png("c")))
                    .part("gallery_images[]", image_part("d.png", png("d")))
                    .part("gallery_images[]", image_part("e.png", png("e"))),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new = gallery_refs(&res.body["product"]);
        assert_eq!(new.len(), 3);
        for (reference, tag) in new.iter().zip(["c", "d", "e"]) {
            assert_eq!(fetch_image(&app, reference).await, (200, png(tag)));
        }
        for reference in &old {
            assert_eq!(fetch_image(&app, reference).await.0, 404);
        }
        assert_eq!(app.blob_count(), 3);
    }

    #[tokio::test]
    async fn keeps_absent_fields_and_clears_empty_ones() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Mug", tournament)
                    .text("description", "Ceramic")
                    .text("weight", "300g")
                    .part("image", image_part("mug.png", png("mug"))),
            )
            .await;
        let id = created.product_id();

        let res = app
            .put_form(
                &routes::product(id),
                product_form("Mug v2", tournament).text("weight", ""),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let product = &res.body["product"];
        assert_eq!(product["name"], "Mug v2");
        assert_eq!(product["description"], "Ceramic");
        assert!(product["weight"].is_null());
        assert_eq!(product["image"], created.body["product"]["image"]);
        assert_eq!(product["is_active"], true);
    }

    #[tokio::test]
    async fn removal_flags_delete_images() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Pin", tournament)
                    .part("image", image_part("pin.png", png("pin")))
                    .part("gallery_images[]", image_part("p1.png", png("p1"))),
            )
            .await;

        let res = app
            .put_form(
                &routes::product(created.product_id()),
                product_form("Pin", tournament)
                    .text("remove_image", "1")
                    .text("remove_gallery_images", "1"),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["product"]["image"].is_null());
        assert!(res.body["product"]["gallery_images"].is_null());
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn own_sku_is_allowed() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(product_form("Scarf", tournament).text("sku", "SC-1"))
            .await;

        let res = app
            .put_form(
                &routes::product(created.product_id()),
                product_form("Scarf", tournament).text("sku", "SC-1"),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["product"]["sku"], "SC-1");
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;

        let res = app
            .put_form(
                &routes::product(9999),
                product_form("Ghost", tournament).part("image", image_part("g.png", png("g"))),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert_eq!(app.blob_count(), 0);
    }
}

mod product_delete {
    use super::*;

    #[tokio::test]
    async fn deletes_product_and_images() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Poster", tournament)
                    .part("image", image_part("p.png", png("p")))
                    .part("gallery_images[]", image_part("x.png", png("x")))
                    .part("gallery_images[]", image_part("y.png", png("y"))),
            )
            .await;
        let id = created.product_id();
        assert_eq!(app.blob_count(), 3);

        let res = app.delete(&routes::product(id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Product deleted successfully.");
        assert_eq!(app.blob_count(), 0);
        assert_eq!(app.get(&routes::product(id)).await.status, 404);
    }

    #[tokio::test]
    async fn refuses_product_with_bookings() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let created = app
            .create_product(
                product_form("Ticket", tournament).part("image", image_part("t.png", png("t"))),
            )
            .await;
        let id = created.product_id();
        app.insert_booking(id, "Ada").await;

        let res = app.delete(&routes::product(id)).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
        assert_eq!(app.blob_count(), 1);
        assert_eq!(app.get(&routes::product(id)).await.status, 200);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.delete(&routes::product(9999)).await;
        assert_eq!(res.status, 404);
    }
}

mod product_read {
    use super::*;

    #[tokio::test]
    async fn lists_newest_first_with_pagination() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        for name in ["first", "second", "third"] {
            app.create_product(product_form(name, tournament)).await;
        }

        let res = app.get(&routes::products_page(1, 2)).await;

        assert_eq!(res.status, 200);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["name"], "third");
        assert_eq!(data[1]["name"], "second");
        assert_eq!(data[0]["tournament"]["name"], "Spring Open");
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app.get(&routes::products_page(2, 2)).await;
        assert_eq!(res.body["data"][0]["name"], "first");
    }

    #[tokio::test]
    async fn default_page_size_applies() {
        let app = TestApp::spawn().await;
        let res = app.get(routes::PRODUCTS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["per_page"], 15);
        assert_eq!(res.body["pagination"]["page"], 1);
    }

    #[tokio::test]
    async fn huge_page_returns_empty_listing() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        app.create_product(product_form("only", tournament)).await;

        let res = app.get(&routes::products_page(u64::MAX, 100)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["data"].as_array().unwrap().is_empty());
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn malformed_page_query_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.get("/api/v1/products?page=abc").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn show_includes_tournament_and_bookings() {
        let app = TestApp::spawn().await;
        let tournament = app.insert_tournament("Spring Open", true, 1).await;
        let id = app
            .create_product(product_form("Seat", tournament))
            .await
            .product_id();
        app.insert_booking(id, "Grace").await;

        let res = app.get(&routes::product(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);
        assert_eq!(res.body["tournament"]["id"], tournament);
        assert_eq!(res.body["bookings"][0]["customer_name"], "Grace");
        assert_eq!(res.body["bookings"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn forms_list_active_tournaments_in_order() {
        let app = TestApp::spawn().await;
        let late = app.insert_tournament("Late", true, 5).await;
        app.insert_tournament("Hidden", false, 0).await;
        let early = app.insert_tournament("Early", true, 1).await;

        let res = app.get(routes::PRODUCT_CREATE_FORM).await;
        assert_eq!(res.status, 200);
        let ids: Vec<i64> = res.body["tournaments"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, [early as i64, late as i64]);

        let id = app
            .create_product(product_form("Hat", late))
            .await
            .product_id();
        let res = app.get(&routes::product_edit_form(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["product"]["id"], id);
        assert_eq!(res.body["tournaments"].as_array().unwrap().len(), 2);

        assert_eq!(app.get(&routes::product_edit_form(9999)).await.status, 404);
    }
}
